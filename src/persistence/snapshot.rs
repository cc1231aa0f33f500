//! Storm snapshots on disk. Each file holds one simulation at one tick and is
//! named `storm-{id}-t{tick}.bin`, so a directory can hold several storms
//! side by side.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::world::Simulation;

/// A snapshot file found on disk, described by its name and file metadata.
#[derive(Debug, Clone)]
pub struct SnapshotMetadata {
    pub path: PathBuf,
    pub storm_id: Uuid,
    pub tick_count: u64,
    pub modified: SystemTime,
    pub file_size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),

    #[error("Corrupt snapshot {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("No valid snapshots found. Start a new storm with: stormtrack simulate")]
    NoValidSnapshots,
}

fn snapshot_filename(storm_id: Uuid, tick_count: u64) -> String {
    format!("storm-{}-t{:06}.bin", storm_id.simple(), tick_count)
}

/// Parse the storm id and tick from `storm-{id}-t{tick}.bin`.
fn parse_snapshot_filename(filename: &str) -> Option<(Uuid, u64)> {
    let stem = filename.strip_suffix(".bin")?.strip_prefix("storm-")?;
    let (id, tick) = stem.split_once("-t")?;
    let id = Uuid::parse_str(id).ok()?;
    let tick = tick.parse::<u64>().ok()?;
    Some((id, tick))
}

/// Why a decoded simulation cannot be resumed, if it cannot.
fn check_simulation(sim: &Simulation) -> Result<(), String> {
    let mut errors = sim.cyclone.validate().err().unwrap_or_default();
    if sim.tick_count * 3 != u64::from(sim.cyclone.age) {
        errors.push(format!(
            "tick {} disagrees with storm age {} h",
            sim.tick_count, sim.cyclone.age
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

/// Save a simulation using an atomic write (temp file, then rename), so a
/// partial write never replaces an existing snapshot. Saving the same storm
/// at the same tick twice overwrites the earlier file.
pub fn save_snapshot(sim: &Simulation, snapshot_dir: &Path) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(snapshot_dir)?;

    let filename = snapshot_filename(sim.id, sim.tick_count);
    let target = snapshot_dir.join(&filename);
    let tmp = snapshot_dir.join(format!(".{}.tmp", filename));

    let encoded = bincode::serialize(sim).map_err(|e| SnapshotError::Serialize(e.to_string()))?;

    if let Err(e) = fs::write(&tmp, &encoded) {
        let _ = fs::remove_file(&tmp);
        return Err(SnapshotError::Io(e));
    }

    if let Err(e) = fs::rename(&tmp, &target) {
        let _ = fs::remove_file(&tmp);
        return Err(SnapshotError::Io(e));
    }

    debug!(storm = %sim.name, tick = sim.tick_count, path = %target.display(), "Snapshot saved");
    Ok(target)
}

/// Load a simulation from a snapshot file and check that the storm inside
/// could have come out of the lifecycle. When the file carries a snapshot
/// name, the storm id and tick inside must match it.
pub fn load_snapshot(path: &Path) -> Result<Simulation, SnapshotError> {
    let data = fs::read(path)?;
    let sim: Simulation =
        bincode::deserialize(&data).map_err(|e| SnapshotError::Deserialize(e.to_string()))?;

    let corrupt = |reason: String| SnapshotError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let named = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(parse_snapshot_filename);
    if let Some((id, tick)) = named.filter(|&(id, tick)| id != sim.id || tick != sim.tick_count) {
        return Err(corrupt(format!(
            "named for storm {} tick {} but holds storm {} tick {}",
            id.simple(),
            tick,
            sim.id.simple(),
            sim.tick_count
        )));
    }

    check_simulation(&sim).map_err(corrupt)?;
    Ok(sim)
}

/// List every storm's snapshots, most recently written first. Snapshots
/// written at the same moment are ordered by descending tick.
pub fn list_snapshots(snapshot_dir: &Path) -> Result<Vec<SnapshotMetadata>, SnapshotError> {
    if !snapshot_dir.exists() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();
    for entry in fs::read_dir(snapshot_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        // Temp files from an interrupted save start with '.' and never parse
        let Some((storm_id, tick_count)) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_snapshot_filename)
        else {
            continue;
        };

        let metadata = entry.metadata()?;
        snapshots.push(SnapshotMetadata {
            path,
            storm_id,
            tick_count,
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            file_size: metadata.len(),
        });
    }

    snapshots.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then(b.tick_count.cmp(&a.tick_count))
    });
    Ok(snapshots)
}

/// One storm's snapshots, latest tick first.
pub fn list_storm_snapshots(
    snapshot_dir: &Path,
    storm_id: Uuid,
) -> Result<Vec<SnapshotMetadata>, SnapshotError> {
    let mut snapshots: Vec<_> = list_snapshots(snapshot_dir)?
        .into_iter()
        .filter(|s| s.storm_id == storm_id)
        .collect();
    snapshots.sort_by(|a, b| b.tick_count.cmp(&a.tick_count));
    Ok(snapshots)
}

/// Keep the `max_snapshots` latest ticks of one storm and delete the rest.
/// Other storms' snapshots are left alone. Returns the deleted paths.
pub fn prune_snapshots(
    snapshot_dir: &Path,
    storm_id: Uuid,
    max_snapshots: usize,
) -> Result<Vec<PathBuf>, SnapshotError> {
    let snapshots = list_storm_snapshots(snapshot_dir, storm_id)?;

    let mut deleted = Vec::new();
    for snapshot in snapshots.iter().skip(max_snapshots) {
        fs::remove_file(&snapshot.path)?;
        deleted.push(snapshot.path.clone());
    }
    Ok(deleted)
}

/// Load the most recently written valid snapshot of any storm, skipping
/// corrupt ones.
pub fn load_latest_valid_snapshot(snapshot_dir: &Path) -> Result<Simulation, SnapshotError> {
    for snapshot in list_snapshots(snapshot_dir)? {
        match load_snapshot(&snapshot.path) {
            Ok(sim) => return Ok(sim),
            Err(e) => {
                warn!(
                    path = %snapshot.path.display(),
                    storm = %snapshot.storm_id.simple(),
                    tick = snapshot.tick_count,
                    error = %e,
                    "Skipping unusable snapshot"
                );
            }
        }
    }

    Err(SnapshotError::NoValidSnapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::scenario::ScenarioParams;
    use crate::config::simulation::SimulationConfig;
    use crate::simulation::execute_tick;
    use crate::simulation::genesis::create_simulation;
    use crate::world::cyclone::{ErcState, Status};
    use crate::world::landmass::OpenOcean;
    use std::time::Duration;
    use tempfile::TempDir;

    fn storm(seed: u64, ticks: u32) -> Simulation {
        let scenario = ScenarioParams {
            seed,
            ..ScenarioParams::default()
        };
        let config = SimulationConfig::default();
        let mut sim = create_simulation(&scenario, &config, &OpenOcean).unwrap();
        for _ in 0..ticks {
            execute_tick(&mut sim, &config, &OpenOcean);
        }
        sim
    }

    /// Write a simulation under its own snapshot name without validation,
    /// stamped with a modification time `age_secs` in the past.
    fn write_raw(dir: &Path, sim: &Simulation, age_secs: u64) -> PathBuf {
        let path = dir.join(snapshot_filename(sim.id, sim.tick_count));
        fs::write(&path, bincode::serialize(sim).unwrap()).unwrap();
        let when = SystemTime::now() - Duration::from_secs(age_secs);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(when)
            .unwrap();
        path
    }

    fn corrupt_reason(result: Result<Simulation, SnapshotError>) -> String {
        match result {
            Err(SnapshotError::Corrupt { reason, .. }) => reason,
            other => panic!("expected a corrupt snapshot, got {:?}", other.map(|s| s.tick_count)),
        }
    }

    #[test]
    fn filename_carries_storm_and_tick() {
        let id = Uuid::from_u128(0xfeed);
        let name = snapshot_filename(id, 42);
        assert_eq!(name, format!("storm-{}-t000042.bin", id.simple()));
        assert_eq!(parse_snapshot_filename(&name), Some((id, 42)));

        // Ticks past the padding still parse
        let long = snapshot_filename(id, 1_234_567);
        assert_eq!(parse_snapshot_filename(&long), Some((id, 1_234_567)));
    }

    #[test]
    fn foreign_filenames_are_ignored() {
        let id = Uuid::from_u128(7).simple().to_string();
        for name in [
            "random.bin".to_string(),
            "storm-tick10-1000.bin".to_string(),
            format!("storm-{}-t.bin", id),
            format!("storm-{}-tabc.bin", id),
            "storm-notauuid-t000010.bin".to_string(),
            format!(".storm-{}-t000010.bin.tmp", id),
        ] {
            assert_eq!(parse_snapshot_filename(&name), None, "{}", name);
        }
    }

    #[test]
    fn saved_storm_resumes_where_it_left_off() {
        let dir = TempDir::new().unwrap();
        let config = SimulationConfig::default();
        let mut sim = storm(42, 6);

        let path = save_snapshot(&sim, dir.path()).unwrap();
        let mut restored = load_snapshot(&path).unwrap();
        assert_eq!(restored, sim);

        for _ in 0..30 {
            let a = execute_tick(&mut sim, &config, &OpenOcean);
            let b = execute_tick(&mut restored, &config, &OpenOcean);
            assert_eq!(a.events, b.events);
        }
        assert_eq!(sim.cyclone, restored.cyclone);
        assert_eq!(sim.forecasts, restored.forecasts);

        // The continued run snapshots cleanly too
        let path = save_snapshot(&restored, dir.path()).unwrap();
        assert_eq!(load_snapshot(&path).unwrap(), sim);
    }

    #[test]
    fn dissipated_storm_round_trips() {
        let dir = TempDir::new().unwrap();
        let config = SimulationConfig::default();
        let mut sim = storm(3, 0);
        while !sim.is_finished() && sim.tick_count < 2_000 {
            execute_tick(&mut sim, &config, &OpenOcean);
        }
        assert_eq!(sim.cyclone.status, Status::Dissipated);

        let path = save_snapshot(&sim, dir.path()).unwrap();
        assert_eq!(load_snapshot(&path).unwrap(), sim);
    }

    #[test]
    fn storm_out_of_step_with_its_track_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let mut sim = storm(42, 2);
        sim.cyclone.age += 3;
        let path = write_raw(dir.path(), &sim, 0);

        let reason = corrupt_reason(load_snapshot(&path));
        assert!(reason.contains("track has 3 points"), "{}", reason);
        assert!(reason.contains("tick 2 disagrees"), "{}", reason);
    }

    #[test]
    fn active_storm_below_dissipation_threshold_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let mut sim = storm(42, 4);
        sim.cyclone.intensity = 12.0;
        sim.cyclone.track.pop();
        sim.cyclone.record_track_point();
        let path = write_raw(dir.path(), &sim, 0);

        let reason = corrupt_reason(load_snapshot(&path));
        assert!(reason.contains("active but meets"), "{}", reason);
    }

    #[test]
    fn runaway_eyewall_replacement_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let mut sim = storm(42, 4);
        sim.cyclone.erc = ErcState::Weakening {
            end_time: sim.cyclone.age + 300,
            mpi_reduction: 20.0,
        };
        let path = write_raw(dir.path(), &sim, 0);

        let reason = corrupt_reason(load_snapshot(&path));
        assert!(reason.contains("weakening ends"), "{}", reason);
    }

    #[test]
    fn renamed_snapshot_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let sim = storm(42, 2);
        let path = save_snapshot(&sim, dir.path()).unwrap();

        let other = dir.path().join(snapshot_filename(Uuid::from_u128(1), sim.tick_count));
        fs::rename(&path, &other).unwrap();
        let reason = corrupt_reason(load_snapshot(&other));
        assert!(reason.contains("named for storm"), "{}", reason);

        // Outside the naming scheme only the contents are checked
        let exported = dir.path().join("exported.bin");
        fs::rename(&other, &exported).unwrap();
        assert_eq!(load_snapshot(&exported).unwrap(), sim);
    }

    #[test]
    fn garbage_and_truncated_files_fail_to_decode() {
        let dir = TempDir::new().unwrap();
        let garbage = dir.path().join("garbage.bin");
        fs::write(&garbage, b"this is not valid bincode data").unwrap();
        assert!(matches!(load_snapshot(&garbage), Err(SnapshotError::Deserialize(_))));

        let data = bincode::serialize(&storm(42, 4)).unwrap();
        let truncated = dir.path().join("truncated.bin");
        fs::write(&truncated, &data[..data.len() / 2]).unwrap();
        assert!(matches!(load_snapshot(&truncated), Err(SnapshotError::Deserialize(_))));
    }

    #[test]
    fn listing_orders_by_write_time_across_storms() {
        let dir = TempDir::new().unwrap();
        let older = storm(1, 5);
        let newer = storm(2, 1);
        write_raw(dir.path(), &older, 60);
        write_raw(dir.path(), &newer, 0);
        fs::write(dir.path().join("notes.txt"), "not a snapshot").unwrap();

        let snapshots = list_snapshots(dir.path()).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].storm_id, newer.id);
        assert_eq!(snapshots[0].tick_count, 1);
        assert_eq!(snapshots[1].storm_id, older.id);
        assert!(snapshots[0].file_size > 0);
    }

    #[test]
    fn listing_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(list_snapshots(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn prune_keeps_latest_ticks_of_one_storm_only() {
        let dir = TempDir::new().unwrap();
        let config = SimulationConfig::default();
        let mut sim = storm(42, 0);
        for _ in 0..5 {
            save_snapshot(&sim, dir.path()).unwrap();
            execute_tick(&mut sim, &config, &OpenOcean);
        }
        let bystander = storm(7, 0);
        save_snapshot(&bystander, dir.path()).unwrap();

        let deleted = prune_snapshots(dir.path(), sim.id, 2).unwrap();
        assert_eq!(deleted.len(), 3);

        let kept: Vec<u64> = list_storm_snapshots(dir.path(), sim.id)
            .unwrap()
            .iter()
            .map(|s| s.tick_count)
            .collect();
        assert_eq!(kept, vec![4, 3]);
        assert_eq!(list_storm_snapshots(dir.path(), bystander.id).unwrap().len(), 1);
        assert!(prune_snapshots(dir.path(), sim.id, 2).unwrap().is_empty());
    }

    #[test]
    fn latest_valid_skips_corrupt_newer_snapshot() {
        let dir = TempDir::new().unwrap();
        let good = storm(42, 2);
        write_raw(dir.path(), &good, 60);

        let mut bad = storm(42, 3);
        bad.cyclone.upwelling_cooling = 9.0;
        write_raw(dir.path(), &bad, 0);

        let restored = load_latest_valid_snapshot(dir.path()).unwrap();
        assert_eq!(restored.tick_count, 2);
        assert_eq!(restored.cyclone, good.cyclone);
    }

    #[test]
    fn latest_valid_with_nothing_usable_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_latest_valid_snapshot(dir.path()),
            Err(SnapshotError::NoValidSnapshots)
        ));

        let id = Uuid::from_u128(9);
        fs::write(dir.path().join(snapshot_filename(id, 10)), b"corrupt").unwrap();
        assert!(matches!(
            load_latest_valid_snapshot(dir.path()),
            Err(SnapshotError::NoValidSnapshots)
        ));
    }

    #[test]
    fn save_leaves_no_temp_files_and_creates_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("snapshots");
        let path = save_snapshot(&storm(42, 1), &nested).unwrap();
        assert!(path.exists());

        let hidden = fs::read_dir(&nested)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().is_some_and(|n| n.starts_with('.')))
            .count();
        assert_eq!(hidden, 0);
    }
}

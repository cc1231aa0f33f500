pub mod snapshot;

pub use snapshot::{
    SnapshotError, SnapshotMetadata, list_snapshots, list_storm_snapshots,
    load_latest_valid_snapshot, load_snapshot, prune_snapshots, save_snapshot,
};

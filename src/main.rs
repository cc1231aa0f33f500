use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use stormtrack::cli::commands;
use stormtrack::config::scenario::ScenarioParams;
use stormtrack::config::simulation::SimulationConfig;
use stormtrack::persistence;

#[derive(Parser)]
#[command(name = "stormtrack")]
#[command(about = "A tropical cyclone lifecycle simulator driven by a synthetic pressure field")]
#[command(version)]
struct Cli {
    /// Path to the simulation configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ScenarioArgs {
    /// Path to a scenario file
    #[arg(short, long)]
    scenario: Option<String>,

    /// Random seed (0 picks one)
    #[arg(long)]
    seed: Option<u64>,

    /// Basin code: WPAC, EPAC, NATL, NIO, SHEM, SIO or SATL
    #[arg(short, long)]
    basin: Option<String>,

    /// Month of genesis, 1-12
    #[arg(short, long)]
    month: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a storm from genesis to dissipation without pacing
    Simulate {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },

    /// Run a storm in real time at the configured tick rate
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Continue from the latest snapshot instead of starting a new storm
        #[arg(long)]
        resume: bool,
    },

    /// Inspect the storm in the latest snapshot
    Inspect {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Regenerate the forecast ensemble from the latest snapshot
    Forecast,

    /// Manage storm snapshots
    Snapshots {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// List available snapshots
    List {
        /// Snapshot directory (defaults to the configured one)
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Restore and display a storm from a snapshot file
    Restore {
        /// Path to the snapshot file
        file: String,
    },
}

fn load_config(path: Option<&str>) -> SimulationConfig {
    let Some(path) = path else {
        return SimulationConfig::default();
    };
    match SimulationConfig::from_file(Path::new(path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_scenario(args: &ScenarioArgs) -> ScenarioParams {
    let mut scenario = match &args.scenario {
        Some(path) => match ScenarioParams::from_file(Path::new(path)) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading scenario: {}", e);
                std::process::exit(1);
            }
        },
        None => ScenarioParams::default(),
    };
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    if let Some(basin) = &args.basin {
        scenario.basin = basin.clone();
    }
    if let Some(month) = args.month {
        scenario.month = month;
    }
    scenario
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    match cli.command {
        Commands::Simulate { scenario } => {
            let scenario = load_scenario(&scenario);
            if let Err(e) = commands::simulate(&config, &scenario) {
                eprintln!("Simulation error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Run { scenario, resume } => {
            let scenario = load_scenario(&scenario);
            if let Err(e) = commands::run_simulation(&config, &scenario, resume).await {
                eprintln!("Simulation error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Inspect { json } => {
            if let Err(e) = commands::inspect(&config, json) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Forecast => {
            if let Err(e) = commands::forecast(&config) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Snapshots { action } => match action {
            SnapshotAction::List { dir } => {
                let dir = dir.unwrap_or_else(|| config.snapshot_directory.clone());
                let snapshot_dir = Path::new(&dir);
                match persistence::list_snapshots(snapshot_dir) {
                    Ok(snapshots) => {
                        if snapshots.is_empty() {
                            println!("No snapshots found in {}", snapshot_dir.display());
                        } else {
                            println!(
                                "{:<34} {:>8} {:>8} {:>12}",
                                "Storm", "Tick", "Age (h)", "Size"
                            );
                            println!("{}", "-".repeat(65));
                            for s in &snapshots {
                                let size_kb = s.file_size / 1024;
                                println!(
                                    "{:<34} {:>8} {:>8} {:>9} KB",
                                    s.storm_id.simple(),
                                    s.tick_count,
                                    s.tick_count * 3,
                                    size_kb
                                );
                            }
                            println!(
                                "\n{} snapshot(s) in {}",
                                snapshots.len(),
                                snapshot_dir.display()
                            );
                        }
                    }
                    Err(e) => {
                        eprintln!("Error listing snapshots: {}", e);
                        std::process::exit(1);
                    }
                }
            }
            SnapshotAction::Restore { file } => {
                let path = Path::new(&file);
                match persistence::load_snapshot(path) {
                    Ok(sim) => {
                        println!("Restored storm from {}", path.display());
                        commands::print_storm_summary(&sim);
                    }
                    Err(e) => {
                        eprintln!("Error restoring snapshot: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        },
    }
}

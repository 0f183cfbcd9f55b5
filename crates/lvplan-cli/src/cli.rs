use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Low-voltage grid routing and electrification planning", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route the low-voltage grid of every cluster
    Route {
        #[command(flatten)]
        inputs: InputArgs,
        /// Substation table; clusters get connected to the nearest feasible one
        #[arg(long, value_hint = ValueHint::FilePath)]
        substations: Option<PathBuf>,
    },
    /// Route clusters, then choose grid connections or microgrids by net present cost
    Plan {
        #[command(flatten)]
        inputs: InputArgs,
        /// Substation table
        #[arg(long, value_hint = ValueHint::FilePath)]
        substations: PathBuf,
        /// Microgrid NPC table from microgrid sizing
        #[arg(long, value_hint = ValueHint::FilePath)]
        microgrids: PathBuf,
    },
    /// Check a configuration file and, optionally, the input tables
    Validate {
        /// Planning configuration (TOML)
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Point grid CSV
        #[arg(long, value_hint = ValueHint::FilePath)]
        points: Option<PathBuf>,
        /// Cluster roster CSV
        #[arg(long, value_hint = ValueHint::FilePath)]
        clusters: Option<PathBuf>,
    },
}

/// Inputs shared by the routing commands.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Planning configuration (TOML)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: PathBuf,
    /// Point grid CSV
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub points: PathBuf,
    /// Cluster roster CSV
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub clusters: PathBuf,
    /// Road vertices CSV (road_id, X, Y)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub roads: Option<PathBuf>,
    /// Output directory
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub out: PathBuf,
    /// Worker threads (0 = all cores); overrides the configuration
    #[arg(long)]
    pub threads: Option<usize>,
}

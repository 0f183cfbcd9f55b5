use clap::Parser;
use lvplan_cli::{Cli, Commands};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Route {
            inputs,
            substations,
        } => commands::route::handle(inputs, substations.as_deref()),
        Commands::Plan {
            inputs,
            substations,
            microgrids,
        } => commands::plan::handle(inputs, substations, microgrids),
        Commands::Validate {
            config,
            points,
            clusters,
        } => commands::validate::handle(config, points.as_deref(), clusters.as_deref()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

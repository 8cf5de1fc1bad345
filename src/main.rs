use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vigil::commands::{inspect, run};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Host and service health-monitoring agent", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run monitoring cycles until interrupted
    Run {
        /// Path to the agent configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<u64>,

        /// Write wire-encoded monitor state to this file after every cycle
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Summarize an exported state file
    Inspect {
        /// Path to a file written by `vigil run --export`
        state_file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            cycles,
            export,
        } => run::execute(&config, cycles, export.as_deref()),
        Commands::Inspect { state_file } => inspect::execute(&state_file),
    }
}

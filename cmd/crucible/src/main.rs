//! Crucible CLI - run a candidate command against a trusted control.
//!
//! Commands:
//! - `crucible run` - Run an experiment between two shell commands
//! - `crucible init` - Write an example experiment.yaml

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod shell;

#[derive(Parser)]
#[command(name = "crucible")]
#[command(about = "Run a candidate command against a trusted control and compare them")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an experiment; prints the control's output and exits with its status
    Run(config::RunArgs),

    /// Write an example experiment file
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the control's output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => {
            let status = commands::run::run(&args).await?;
            if status != 0 {
                std::process::exit(status);
            }
            Ok(())
        }
        Commands::Init { path } => commands::init::run(&path),
    }
}

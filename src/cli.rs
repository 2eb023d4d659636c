//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Manifest Engine - Aggregate, filter and transform manifest objects
#[derive(Parser, Debug)]
#[command(name = "manifest-engine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (off, error, warn, info, debug, trace).
    ///
    /// `RUST_LOG` takes precedence when set.
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        env = "MANIFEST_ENGINE_LOG",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render manifests from files and directories to stdout
    Render(commands::render::RenderArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Render(args) => commands::render::execute(args),
        }
    }
}

/// Logs go to stderr so rendered output on stdout stays clean
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .try_init();
}

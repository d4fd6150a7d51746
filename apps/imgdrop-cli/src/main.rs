//! imgdrop command line entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use imgdrop_transfer::MIB;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imgdrop", author, version, about, long_about = None)]
struct Args {
    /// Base URL of the application serving the storage endpoints
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Configuration file (defaults to the per-user config path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum number of files per run
    #[arg(long, global = true)]
    max_files: Option<usize>,

    /// Maximum size per file, in MiB
    #[arg(long, global = true)]
    max_size_mb: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload image files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete stored objects by key
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

impl Args {
    /// Applies command line overrides on top of the file configuration.
    fn apply(&self, config: &mut config::Config) {
        if let Some(base) = &self.api_base {
            config.api_base_url = base.clone();
        }
        if let Some(max) = self.max_files {
            config.max_file_count = max;
        }
        if let Some(mb) = self.max_size_mb {
            config.max_file_size_bytes = mb.saturating_mul(MIB);
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = config::Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    tracing::info!(api = %config.api_base_url, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    match args.command {
        Command::Upload { paths } => rt.block_on(app::upload(&config, &paths)),
        Command::Delete { keys } => rt.block_on(app::delete(&config, &keys)),
    }
}

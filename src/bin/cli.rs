//! sparsekv CLI
//!
//! Command-line interface for a local sparsekv store.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sparsekv::{Config, Engine, MemTableEntry};
use tracing_subscriber::{fmt, EnvFilter};

/// sparsekv CLI
#[derive(Parser, Debug)]
#[command(name = "sparsekv-cli")]
#[command(about = "Embedded LSM key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./sparsekv_data")]
    data_dir: String,

    /// Sample every N-th key into the sparse index
    #[arg(short, long, default_value = "16")]
    sparse_distance: usize,

    /// Distinct keys in the memtable before a flush
    #[arg(short = 'm', long, default_value = "4")]
    memtable_threshold: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Flush the memtable to a new sorted run
    Flush,

    /// Merge the two oldest sorted runs
    Compact,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sparsekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .sparse_key_distance(args.sparse_distance)
        .memtable_threshold(args.memtable_threshold)
        .build();

    let engine = match Engine::open(config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&engine, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(engine: &Engine, command: Commands) -> sparsekv::Result<()> {
    match command {
        Commands::Get { key } => match engine.lookup(key.as_bytes())? {
            Some(MemTableEntry::Value(value)) => println!("{}", String::from_utf8_lossy(&value)),
            Some(MemTableEntry::Tombstone) => println!("(deleted)"),
            None => println!("(nil)"),
        },
        Commands::Put { key, value } => {
            engine.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            engine.delete(key.as_bytes())?;
            println!("OK");
        }
        Commands::Flush => {
            engine.flush()?;
            println!("OK ({} live runs)", engine.live_runs());
        }
        Commands::Compact => {
            if engine.compact()? {
                println!("OK ({} live runs)", engine.live_runs());
            } else {
                println!("Nothing to compact");
            }
        }
    }
    Ok(())
}

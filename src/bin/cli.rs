//! Sett CLI
//!
//! Command-line interface for a Sett store on local disk.

use std::io::{self, BufRead};

use clap::{Parser, Subcommand};
use sett::{Config, Sett};
use tracing_subscriber::{fmt, EnvFilter};

/// Sett CLI
#[derive(Parser, Debug)]
#[command(name = "sett-cli")]
#[command(about = "CLI for Sett virtual tables")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./sett_data")]
    data_dir: String,

    /// Table to operate on (empty for the default table)
    #[arg(short, long, default_value = "")]
    table: String,

    /// Items per chunk when loading a batch
    #[arg(short, long, default_value = "500")]
    chunk_size: usize,

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
    Set {
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

    /// List entries of the table, optionally only keys starting with FILTER
    Scan {
        /// Key prefix inside the table
        filter: Option<String>,
    },

    /// Delete every key of the table
    Drop,

    /// Batch-load `key<TAB>value` lines from stdin
    Load,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sett=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .chunk_size(args.chunk_size)
        .build();

    // Open store
    let sett = match Sett::open(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let result = run(&sett, &args.table, args.command);

    if let Err(e) = sett.close() {
        tracing::error!("Failed to close store: {}", e);
    }

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(sett: &Sett, table: &str, command: Commands) -> sett::Result<()> {
    let table = sett.table(table)?;

    match command {
        Commands::Get { key } => {
            let value = table.get(&key)?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::Set { key, value } => table.set(&key, &value)?,
        Commands::Del { key } => table.delete(&key)?,
        Commands::Scan { filter } => {
            let entries = table.scan(filter.as_deref().map(str::as_bytes))?;
            for (key, value) in entries {
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&value)
                );
            }
        }
        Commands::Drop => {
            let deleted = table.drop_table()?;
            println!("dropped {} keys", deleted);
        }
        Commands::Load => {
            let mut batch = table.batch();
            for line in io::stdin().lock().lines() {
                let line = line?;
                match line.split_once('\t') {
                    Some((key, value)) => batch.batchup(key, value),
                    None if line.is_empty() => continue,
                    None => tracing::warn!("skipping line without a tab: {:?}", line),
                }
            }
            let report = batch.flush()?;
            println!("loaded {} items in {} chunks", report.items, report.chunks);
        }
    }

    Ok(())
}

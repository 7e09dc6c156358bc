//! STM CLI
//!
//! Command-line tools for the STM engine.
//!
//! # Commands
//!
//! - `demo` - Run the registry scenario step by step
//! - `stress` - Hammer one counter from several threads
//! - `blobs` - List the blobs in a blob log
//! - `sequence` - List the records of a sequence file
//! - `array` - List the elements of a fixed-width array file

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// STM engine command-line tools.
#[derive(Parser)]
#[command(name = "stm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Element width of an array file.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Width {
    /// 32-bit elements
    #[value(name = "32")]
    W32,
    /// 64-bit elements
    #[value(name = "64")]
    W64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the registry scenario: commit "foo", fail to commit "bar", read back
    Demo {
        /// Append blobs to this log file instead of keeping them in memory
        #[arg(short, long)]
        blob_log: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Increment one counter from several threads with retried transactions
    Stress {
        /// Number of threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Increments per thread
        #[arg(short, long, default_value = "1000")]
        increments: usize,

        /// Attempts per increment before giving up
        #[arg(short, long, default_value = "1000")]
        max_attempts: u32,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the blobs of a blob log
    Blobs {
        /// Path to the blob log
        path: PathBuf,

        /// Maximum number of blobs to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the records of a sequence file
    Sequence {
        /// Path to the sequence file
        path: PathBuf,

        /// Maximum number of records to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the elements of an array file
    Array {
        /// Path to the array file
        path: PathBuf,

        /// Element width in bits
        #[arg(short, long, value_enum, default_value = "32")]
        width: Width,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Demo { blob_log, format } => {
            commands::demo::run(blob_log.as_deref(), &format)?;
        }
        Commands::Stress {
            threads,
            increments,
            max_attempts,
            format,
        } => {
            commands::stress::run(threads, increments, max_attempts, &format)?;
        }
        Commands::Blobs {
            path,
            limit,
            format,
        } => {
            commands::blobs::run(&path, limit, &format)?;
        }
        Commands::Sequence {
            path,
            limit,
            format,
        } => {
            commands::sequence::run(&path, limit, &format)?;
        }
        Commands::Array {
            path,
            width,
            format,
        } => match width {
            Width::W32 => commands::array::run::<i32>(&path, &format)?,
            Width::W64 => commands::array::run::<i64>(&path, &format)?,
        },
        Commands::Version => {
            println!("STM CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

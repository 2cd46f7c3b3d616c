//! SchemaProbe CLI
//!
//! Command-line tools for schema-managed stores kept in a JSON state file.
//!
//! # Commands
//!
//! - `open` - Open a store against a schema, upgrading it if needed
//! - `diff` - Show how a store differs from a schema without changing it
//! - `inspect` - List stores, versions, collections and indexes
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SchemaProbe command-line tools.
#[derive(Parser)]
#[command(name = "schemaprobe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the engine state file
    #[arg(global = true, short, long)]
    state: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a store, converging it to a schema
    Open {
        /// Store name
        #[arg(short, long)]
        name: String,

        /// Schema file (JSON)
        #[arg(long)]
        schema: PathBuf,

        /// Open at exactly this version instead of probing
        #[arg(long)]
        version: Option<u64>,

        /// Collection to leave alone (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Maximum number of open attempts
        #[arg(long, default_value_t = schemaprobe_core::DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,
    },

    /// Show schema drift without upgrading
    Diff {
        /// Store name
        #[arg(short, long)]
        name: String,

        /// Schema file (JSON)
        #[arg(long)]
        schema: PathBuf,

        /// Collection to leave alone (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List stores and their catalogs
    Inspect {
        /// Only this store
        #[arg(short, long)]
        name: Option<String>,

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
        Commands::Open {
            name,
            schema,
            version,
            exclude,
            max_attempts,
        } => {
            let state = cli.state.ok_or("State file required for open")?;
            let options = commands::version_options(version, exclude, max_attempts);
            commands::open::run(&state, &name, &schema, &options)?;
        }
        Commands::Diff {
            name,
            schema,
            exclude,
            format,
        } => {
            let state = cli.state.ok_or("State file required for diff")?;
            let exclude = exclude.into_iter().collect();
            commands::diff::run(&state, &name, &schema, &exclude, &format)?;
        }
        Commands::Inspect { name, format } => {
            let state = cli.state.ok_or("State file required for inspect")?;
            commands::inspect::run(&state, name.as_deref(), &format)?;
        }
        Commands::Version => {
            println!("SchemaProbe CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("SchemaProbe Core v{}", schemaprobe_core::VERSION);
        }
    }

    Ok(())
}

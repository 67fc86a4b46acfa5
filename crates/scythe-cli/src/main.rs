//! Scythe command-line client.
//!
//! Applies schema catalogs, loads rows, inspects the relationship graph,
//! and runs deletion plans against a local database.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scythe command-line client
#[derive(Parser, Debug)]
#[command(name = "scythe")]
#[command(version, about = "Cascading deletion over a schema catalog")]
pub struct Args {
    /// Database directory
    #[arg(short, long, default_value = "./scythe_data")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a schema catalog from a JSON file
    Apply {
        /// Path to the schema JSON
        schema: PathBuf,
    },
    /// Load rows from a JSON file of per-table arrays
    Load {
        /// Path to the data JSON
        data: PathBuf,
    },
    /// Print the resolved relationships of an entity
    Graph {
        /// Entity name
        entity: String,
    },
    /// Run a deletion plan against root rows
    Run {
        /// Path to the plan JSON
        #[arg(long)]
        plan: PathBuf,

        /// Root entity or table name
        #[arg(long)]
        entity: String,

        /// Primary key values of the root rows
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scythe_core=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Command::Apply { schema } => commands::apply(&args.db, &schema),
        Command::Load { data } => commands::load(&args.db, &data),
        Command::Graph { entity } => commands::graph(&args.db, &entity),
        Command::Run { plan, entity, ids } => commands::run_plan(&args.db, &plan, &entity, &ids),
    }
}

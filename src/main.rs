use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use neo_graph::logging::init_logging;
use neo_graph::{
    load_approaches, load_neos, write_to_csv, write_to_json, Config, NeoDatabase,
    UnresolvedPolicy,
};

#[derive(Parser)]
#[command(name = "neo-graph")]
#[command(about = "Explore near-Earth objects and their close approaches to Earth")]
#[command(version)]
struct Cli {
    /// NEO CSV file (overrides NEO_FILE)
    #[arg(long, global = true)]
    neofile: Option<PathBuf>,
    /// Close-approach JSON file (overrides CAD_FILE)
    #[arg(long, global = true)]
    cadfile: Option<PathBuf>,
    /// Unresolved approaches: drop, keep or error (overrides NEO_UNRESOLVED_POLICY)
    #[arg(long, global = true)]
    unresolved: Option<UnresolvedPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print ingestion and linking statistics
    Summary,
    /// Look up one NEO
    Inspect {
        /// Primary designation
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        pdes: Option<String>,
        /// IAU name
        #[arg(long)]
        name: Option<String>,
        /// Also list its close approaches
        #[arg(long, short)]
        verbose: bool,
    },
    /// Write linked close approaches to .csv or .json
    Export {
        #[arg(long)]
        outfile: PathBuf,
        /// Write at most this many approaches
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();
    init_logging("neo_graph=info");

    let mut config = Config::from_env()?;
    if let Some(path) = cli.neofile {
        config.neo_file = path;
    }
    if let Some(path) = cli.cadfile {
        config.cad_file = path;
    }
    if let Some(policy) = cli.unresolved {
        config.unresolved = policy;
    }

    let db = load_database(&config)?;

    match cli.command {
        Commands::Summary => {
            println!("{}", db.report().summary());
        }
        Commands::Inspect { pdes, name, verbose } => {
            let neo = match (&pdes, &name) {
                (Some(pdes), _) => db.get_neo_by_designation(pdes),
                (None, Some(name)) => db.get_neo_by_name(name),
                (None, None) => None,
            };
            let Some(neo) = neo else {
                println!("No matching NEOs exist in the database.");
                return Ok(());
            };

            println!("{}", neo);
            if verbose {
                for approach in neo.approaches() {
                    println!("- {}", approach.describe()?);
                }
            }
        }
        Commands::Export { outfile, limit } => {
            // Approaches kept unresolved have no NEO columns to export
            let skipped = db.approaches().iter().filter(|a| !a.is_linked()).count();
            if skipped > 0 {
                warn!(skipped, "not exporting close approaches with no matching NEO");
            }
            let approaches = db
                .approaches()
                .iter()
                .filter(|approach| approach.is_linked())
                .take(limit.unwrap_or(usize::MAX));
            let written = match outfile.extension().and_then(|ext| ext.to_str()) {
                Some("csv") => write_to_csv(approaches, &outfile)?,
                Some("json") => write_to_json(approaches, &outfile)?,
                _ => bail!(
                    "Unsupported output format: {} (expected .csv or .json)",
                    outfile.display()
                ),
            };
            println!("Wrote {} close approaches to {}", written, outfile.display());
        }
    }

    Ok(())
}

fn load_database(config: &Config) -> Result<NeoDatabase> {
    info!(
        neo_file = %config.neo_file.display(),
        cad_file = %config.cad_file.display(),
        "loading data"
    );

    let neos = load_neos(&config.neo_file)?;
    let approaches = load_approaches(&config.cad_file)?;

    NeoDatabase::with_policy(neos.records, approaches.records, config.unresolved)
        .context("Failed to link close approaches to NEOs")
}

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mirrordna::{ChecksumEngine, ChecksumInput, ChecksumKind, CollectionStore, Record};

#[derive(Parser)]
#[command(name = "mirrordna")]
#[command(about = "Agent state integrity: checksums, collection storage, drift detection")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage root for collections (defaults to ~/.mirrordna/data)
    #[arg(short, long, env = "MIRRORDNA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a SHA-256 checksum
    Checksum {
        #[command(subcommand)]
        target: ChecksumTarget,
    },

    /// Verify a value against an expected checksum
    Verify {
        /// Checksum kind: file, text, or state
        #[arg(short, long)]
        kind: String,

        /// Path (file), raw text (text), or JSON document (state)
        value: String,

        /// Expected 64-hex-char checksum
        #[arg(short, long)]
        expected: String,
    },

    /// Manage collection records
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum ChecksumTarget {
    /// Checksum a file, streamed in fixed-size chunks
    File { path: PathBuf },

    /// Checksum a text payload
    Text { text: String },

    /// Checksum a JSON document in canonical form
    State { json: String },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Create a record (JSON object carrying the collection's identity field)
    Create { collection: String, record: String },

    /// Read a record by id
    Read { collection: String, id: String },

    /// Shallow-merge JSON fields into an existing record
    Update {
        collection: String,
        id: String,
        updates: String,
    },

    /// Delete a record by id
    Delete { collection: String, id: String },

    /// Query records by exact match (dotted paths allowed in keys)
    Query {
        collection: String,

        /// Filters as a JSON object, e.g. '{"metadata.priority": "high"}'
        #[arg(short, long, default_value = "{}")]
        filters: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("mirrordna=debug,info")
    } else {
        EnvFilter::new("mirrordna=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Checksum { target } => cmd_checksum(target),
        Commands::Verify {
            kind,
            value,
            expected,
        } => cmd_verify(&kind, &value, &expected),
        Commands::Store { action } => {
            let store = match cli.data_dir {
                Some(dir) => CollectionStore::open(dir)?,
                None => CollectionStore::open_default()?,
            };
            cmd_store(&store, action)
        }
    }
}

fn cmd_checksum(target: ChecksumTarget) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ChecksumEngine::new();
    let digest = match target {
        ChecksumTarget::File { path } => {
            info!("Checksumming file {}", path.display());
            engine.checksum_file(&path)?
        }
        ChecksumTarget::Text { text } => engine.checksum_text(&text),
        ChecksumTarget::State { json } => {
            let doc: Value = serde_json::from_str(&json)?;
            engine.checksum_state(&doc)
        }
    };
    println!("{digest}");
    Ok(())
}

fn cmd_verify(kind: &str, value: &str, expected: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ChecksumEngine::new();
    let kind: ChecksumKind = kind.parse()?;

    let matched = match kind {
        ChecksumKind::File => {
            engine.verify(ChecksumInput::File(std::path::Path::new(value)), expected)?
        }
        ChecksumKind::Text => engine.verify(ChecksumInput::Text(value), expected)?,
        ChecksumKind::State => {
            let doc: Value = serde_json::from_str(value)?;
            engine.verify(ChecksumInput::State(&doc), expected)?
        }
    };

    if matched {
        println!("{} checksum verified ({})", "✓".green(), kind.as_str());
        Ok(())
    } else {
        Err(format!("checksum mismatch for {} input", kind.as_str()).into())
    }
}

fn cmd_store(store: &CollectionStore, action: StoreAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        StoreAction::Create { collection, record } => {
            let record = parse_object(&record, "record")?;
            let id = store.create(&collection, &record)?;
            println!("{} created '{}' in collection '{}'", "✓".green(), id, collection);
        }

        StoreAction::Read { collection, id } => match store.read(&collection, &id)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("record '{}' not found in collection '{}'", id, collection),
        },

        StoreAction::Update {
            collection,
            id,
            updates,
        } => {
            let updates = parse_object(&updates, "updates")?;
            match store.update(&collection, &id, &updates)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("record '{}' not found in collection '{}'", id, collection),
            }
        }

        StoreAction::Delete { collection, id } => {
            if store.delete(&collection, &id)? {
                println!("{} deleted '{}' from collection '{}'", "✓".green(), id, collection);
            } else {
                println!("record '{}' not found in collection '{}'", id, collection);
            }
        }

        StoreAction::Query {
            collection,
            filters,
            limit,
        } => {
            let filters = parse_object(&filters, "filters")?;
            let results = store.query(&collection, &filters, limit)?;
            info!("{} records matched in '{}'", results.len(), collection);
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

fn parse_object(json: &str, what: &str) -> Result<Record, Box<dyn std::error::Error>> {
    let value: Value = serde_json::from_str(json)?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| format!("{what} must be a JSON object").into())
}

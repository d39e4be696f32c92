//! deaddrop CLI - drive the relay from the command line
//!
//! Exposes the export and gist mapping operations over a durable store
//! file, or over an in-memory store for throwaway runs. Failures exit with
//! a code per failure class so wrappers can tell "retry won't help" from
//! "retry later" from "resource gone".

use clap::{Parser, Subcommand};
use deaddrop::{
    Bundle, Error, ErrorClass, ExportStore, FileBackend, MappingStore, MemoryBackend, RecordKind,
    StorageBackend,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "deaddrop")]
#[command(about = "A single-use content relay with gist id mapping")]
#[command(version)]
struct Cli {
    /// Path to the store file
    #[arg(short, long, default_value = "relay.drop")]
    database: PathBuf,

    /// Keep records in memory only (nothing persists past this invocation)
    #[arg(long)]
    ephemeral: bool,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new store file
    Init,

    // === Export Commands ===
    /// Export a bundle, printing its single-use retrieval id
    Export {
        /// Fields as name=text pairs, in order
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Retrieve a bundle by retrieval id, consuming it
    Retrieve {
        /// The retrieval id
        id: String,
    },

    // === Gist Mapping Commands ===
    /// Generate an internal id verified unused
    NewId,

    /// Associate an external gist id with an internal id
    GistStore {
        /// The externally issued gist id
        external: String,
        /// The internal id (defaults to a freshly generated one)
        #[arg(short, long)]
        internal: Option<String>,
    },

    /// Resolve an internal id to its external gist id
    GistResolve {
        /// The internal id
        internal: String,
    },

    /// Show live record counts
    Status,
}

fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "deaddrop=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let backend: Arc<dyn StorageBackend> = if cli.ephemeral {
        Arc::new(MemoryBackend::new())
    } else if matches!(cli.command, Commands::Init) {
        Arc::new(FileBackend::create(&cli.database)?)
    } else {
        Arc::new(FileBackend::open_or_create(&cli.database)?)
    };

    match run(&cli, backend) {
        Ok(value) => {
            output(cli.format, &value);
            Ok(())
        }
        Err(e) => {
            output(
                cli.format,
                &serde_json::json!({
                    "status": "error",
                    "message": e.to_string()
                }),
            );
            std::process::exit(exit_code(e.class()));
        }
    }
}

fn run(cli: &Cli, backend: Arc<dyn StorageBackend>) -> deaddrop::Result<serde_json::Value> {
    match &cli.command {
        Commands::Init => Ok(serde_json::json!({
            "status": "ok",
            "message": format!("Created store at {}", cli.database.display())
        })),

        Commands::Export { fields } => {
            let mut bundle = Bundle::new();
            for pair in fields {
                let (name, text) = parse_field(pair)?;
                bundle = bundle.with_field(name, text);
            }
            let exports = ExportStore::new(backend);
            let id = exports.export(&bundle)?;
            Ok(serde_json::json!({
                "status": "ok",
                "id": id
            }))
        }

        Commands::Retrieve { id } => {
            let exports = ExportStore::new(backend);
            let bundle = exports.retrieve(id)?;
            let fields: Vec<_> = bundle
                .fields
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "name": f.name,
                        "text": f.text
                    })
                })
                .collect();
            Ok(serde_json::json!({
                "status": "ok",
                "id": bundle.id,
                "fields": fields
            }))
        }

        Commands::NewId => {
            let mappings = MappingStore::new(backend);
            let id = mappings.generate_unused_id()?;
            Ok(serde_json::json!({
                "status": "ok",
                "id": id
            }))
        }

        Commands::GistStore { external, internal } => {
            let mappings = MappingStore::new(backend);
            let internal = match internal {
                Some(id) => id.clone(),
                None => mappings.generate_unused_id()?,
            };
            let echoed = mappings.store(external, &internal)?;
            Ok(serde_json::json!({
                "status": "ok",
                "external": echoed,
                "internal": internal
            }))
        }

        Commands::GistResolve { internal } => {
            let mappings = MappingStore::new(backend);
            let external = mappings.resolve(internal)?;
            Ok(serde_json::json!({
                "status": "ok",
                "external": external
            }))
        }

        Commands::Status => Ok(serde_json::json!({
            "status": "ok",
            "bundles": backend.count(RecordKind::Bundle)?,
            "mappings": backend.count(RecordKind::Mapping)?
        })),
    }
}

/// Split a `name=text` argument
fn parse_field(pair: &str) -> deaddrop::Result<(&str, &str)> {
    pair.split_once('=')
        .ok_or_else(|| Error::BadRequest(format!("expected name=text, got '{}'", pair)))
}

fn output(format: OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => println!("{}", value),
        OutputFormat::Text => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    println!("{}: {}", key, val);
                }
            } else {
                println!("{}", value);
            }
        }
    }
}

fn exit_code(class: ErrorClass) -> i32 {
    match class {
        ErrorClass::BadRequest => 2,
        ErrorClass::NotFound => 3,
        ErrorClass::Conflict => 4,
        ErrorClass::Unavailable => 5,
    }
}

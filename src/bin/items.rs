//! Schema Items CLI
//!
//! Inspects record types declared in TOML definition files and dumps
//! records as total JSON mappings.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_items::{dumps, ItemsConfig, SchemaRegistry, Serializer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-items")]
#[command(about = "Inspect record schemas and dump records as JSON")]
struct Cli {
    /// Config file (defaults to items.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Extra definition files, loaded after the configured ones
    #[arg(short, long = "definitions")]
    definitions: Vec<PathBuf>,

    /// Force compact output
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered record types
    Types,

    /// Print the effective schema of a record type
    Schema {
        /// Record type name
        name: String,
    },

    /// Dump a record with no fields assigned
    Zero {
        /// Record type name
        name: String,
    },

    /// Load a JSON object into a record and dump it
    Dump {
        /// Record type name
        name: String,
        /// Input file ("-" or omitted for stdin)
        input: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match ItemsConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: ItemsConfig) -> anyhow::Result<()> {
    let mut registry: SchemaRegistry = config
        .build_registry()
        .context("loading configured definitions")?;
    for path in &cli.definitions {
        registry
            .load_file(path)
            .with_context(|| format!("loading definitions from {}", path.display()))?;
    }

    let format = if cli.compact {
        schema_items::OutputFormat::Compact
    } else {
        config.export.output_format
    };

    match cli.command {
        Commands::Types => {
            if registry.is_empty() {
                bail!("no record types registered; pass --definitions or configure [registry]");
            }
            for name in registry.names() {
                let record_type = registry.require(name)?;
                let bases: Vec<&str> = record_type.bases().iter().map(|b| b.name()).collect();
                if bases.is_empty() {
                    println!("{} ({} fields)", name, record_type.schema().len());
                } else {
                    println!(
                        "{} ({} fields) extends {}",
                        name,
                        record_type.schema().len(),
                        bases.join(", ")
                    );
                }
            }
        }

        Commands::Schema { name } => {
            let record_type = registry.require(&name)?;
            println!("{}", format.render(&record_type.schema().describe())?);
        }

        Commands::Zero { name } => {
            let record_type = registry.require(&name)?;
            let dumped = dumps(&record_type.instantiate());
            println!("{}", format.render(&serde_json::Value::Object(dumped))?);
        }

        Commands::Dump { name, input } => {
            let record_type = registry.require(&name)?;
            let text = match input {
                Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                _ => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let serializer = Serializer::new();
            let record = serializer.loads_json(record_type, &text)?;
            let dumped = serializer.dumps(&record);
            println!("{}", format.render(&serde_json::Value::Object(dumped))?);
        }
    }

    Ok(())
}

//! csvgraph CLI - convert delimited files into graph entities
//!
//! Reads one input file as described by an import configuration YAML and
//! writes the resulting nodes or relationships as JSON.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use csvgraph::{
    CharSeeker, ImportConfig, InputEntityDeserializer, InputError, JsonArrayWriter, NdjsonWriter,
};

#[derive(Parser)]
#[command(name = "csvgraph")]
#[command(version, about = "Convert delimited files into graph nodes and relationships", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One JSON object per line
    Ndjson,
    /// A single JSON array
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an input file and write its entities
    Import {
        /// Path to the import configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Delimited input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "ndjson")]
        format: OutputFormat,
    },

    /// Read an input file and report the first bad record, if any
    Check {
        /// Path to the import configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Delimited input file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import {
            config,
            input,
            output,
            format,
        } => import(config, input, output, format),
        Commands::Check { config, input } => check(config, input),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn open(
    config: &Path,
    input: &Path,
) -> Result<InputEntityDeserializer<impl CharSeeker>, String> {
    let config = ImportConfig::load_from_file(config).map_err(|e| e.to_string())?;
    let deserializer = config.open(input).map_err(|e| e.to_string())?;
    tracing::info!(
        input = %input.display(),
        kind = ?config.kind,
        header = %deserializer.header(),
        "Reading entities"
    );
    Ok(deserializer)
}

fn describe(error: InputError) -> String {
    tracing::debug!(kind = ?error.kind(), "Record failed");
    error.to_string()
}

/// Convert an input file and write its entities
fn import(
    config: PathBuf,
    input: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<(), String> {
    let mut deserializer = open(&config, &input)?;

    let writer: Box<dyn Write> = match &output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let written = match format {
        OutputFormat::Ndjson => {
            let mut out = NdjsonWriter::new(writer);
            for entity in deserializer.by_ref() {
                out.write(&entity.map_err(describe)?)
                    .map_err(|e| e.to_string())?;
            }
            out.flush().map_err(|e| e.to_string())?;
            out.written()
        }
        OutputFormat::Json => {
            let mut out = JsonArrayWriter::new(writer).map_err(|e| e.to_string())?;
            for entity in deserializer.by_ref() {
                out.write(&entity.map_err(describe)?)
                    .map_err(|e| e.to_string())?;
            }
            let written = out.written();
            out.finish().map_err(|e| e.to_string())?;
            written
        }
    };

    let bytes = deserializer.position();
    deserializer.close().map_err(describe)?;
    tracing::info!(entities = written, bytes, "Import complete");
    Ok(())
}

/// Read every record without writing anything
fn check(config: PathBuf, input: PathBuf) -> Result<(), String> {
    let mut deserializer = open(&config, &input)?;

    let mut count: u64 = 0;
    while let Some(_entity) = deserializer.next_entity().map_err(describe)? {
        count += 1;
    }

    deserializer.close().map_err(describe)?;
    println!("{}: {} entities OK", input.display(), count);
    Ok(())
}

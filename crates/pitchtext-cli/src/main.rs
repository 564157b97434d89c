//! pitchtext command-line interface.
//!
//! Extracted text goes to stdout; logs go to stderr and are controlled by `RUST_LOG`.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use pitchtext::{ExtractionConfig, ExtractionResult, PayloadBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Path header followed by the extracted text
    Text,
    /// One JSON object per input, in input order
    Json,
}

#[derive(Parser)]
#[command(name = "pitchtext")]
#[command(version, about = "Extract layout-preserving text from pitch-deck documents", long_about = None)]
struct Cli {
    /// Configuration file (.toml, .yaml or .json). Defaults to the nearest pitchtext.toml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from one or more files
    Extract {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Maximum concurrent extractions
        #[arg(long)]
        max_concurrent: Option<usize>,
    },

    /// Build the prompt-plus-documents payload for a batch of files
    Payload {
        /// File holding the instruction prompt
        #[arg(short, long)]
        prompt: PathBuf,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the MIME type pitchtext assigns to a file
    Mime { file: PathBuf },

    /// List the MIME types with a registered extractor
    Formats,
}

#[derive(Serialize)]
struct FileOutput<'a> {
    path: String,
    #[serde(flatten)]
    result: &'a ExtractionResult,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    if let Some(path) = path {
        return ExtractionConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }
    Ok(ExtractionConfig::discover()
        .context("Failed to load discovered configuration")?
        .unwrap_or_default())
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn render_text(files: &[PathBuf], results: &[ExtractionResult]) -> String {
    files
        .iter()
        .zip(results)
        .map(|(path, result)| format!("{}\n\n{}\n", display_path(path), result.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_json(files: &[PathBuf], results: &[ExtractionResult]) -> Result<String> {
    let outputs: Vec<FileOutput<'_>> = files
        .iter()
        .zip(results)
        .map(|(path, result)| FileOutput {
            path: display_path(path),
            result,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&outputs)?)
}

fn report_failures(files: &[PathBuf], results: &[ExtractionResult]) -> usize {
    let mut failed = 0;
    for (path, result) in files.iter().zip(results) {
        if let Some(error) = &result.metadata.error {
            tracing::warn!("{}: {} ({})", path.display(), error.message, error.error_type);
            failed += 1;
        }
    }
    failed
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract {
            files,
            format,
            max_concurrent,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if max_concurrent.is_some() {
                config.max_concurrent_extractions = max_concurrent;
            }
            config.validate()?;

            let results = pitchtext::batch_extract_file(files.clone(), &config).await?;
            let failed = report_failures(&files, &results);

            match format {
                OutputFormat::Text => print!("{}", render_text(&files, &results)),
                OutputFormat::Json => println!("{}", render_json(&files, &results)?),
            }

            if failed == files.len() {
                bail!("No file could be extracted");
            }
            Ok(())
        }

        Commands::Payload { prompt, files } => {
            let config = load_config(cli.config.as_deref())?;
            let prompt_text = std::fs::read_to_string(&prompt)
                .with_context(|| format!("Failed to read prompt from {}", prompt.display()))?;

            let results = pitchtext::batch_extract_file(files.clone(), &config).await?;
            report_failures(&files, &results);

            let entries: Vec<(String, ExtractionResult)> =
                files.iter().map(|p| display_path(p)).zip(results).collect();
            let payload = PayloadBuilder::new(config.payload).build(prompt_text.trim_end(), &entries)?;
            print!("{}", payload);
            Ok(())
        }

        Commands::Mime { file } => {
            let mime_type = pitchtext::detect_mime_type(&file, true)?;
            println!("{}", mime_type);
            Ok(())
        }

        Commands::Formats => {
            pitchtext::extractors::ensure_initialized()?;
            let registry = pitchtext::get_document_extractor_registry();
            let mime_types = registry
                .read()
                .map_err(|e| anyhow::anyhow!("Document extractor registry lock poisoned: {}", e))?
                .mime_types();
            for mime_type in mime_types {
                println!("{}", mime_type);
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    run(Cli::parse()).await
}

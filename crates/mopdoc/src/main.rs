use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use mopdoc::{archive, download, pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "mopdoc")]
#[command(about = "PDF extraction pipeline: digital text, OCR, tables, forms, search index")]
#[command(version)]
struct Cli {
    /// Path to a local PDF to process
    #[arg(long, conflicts_with = "url")]
    pdf: Option<PathBuf>,

    /// URL of a PDF to download and process
    #[arg(long)]
    url: Option<String>,

    /// Output directory for the extraction artifacts
    #[arg(long, default_value = "resultado")]
    output: PathBuf,

    /// Tesseract language code for scanned pages (defaults to "spa")
    #[arg(long)]
    lang: Option<String>,

    /// Optional JSON config file overriding the pipeline defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mopdoc=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path).map_err(anyhow::Error::msg)?,
        None => PipelineConfig::default(),
    };
    if let Some(lang) = &cli.lang {
        config.language = lang.clone();
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let pdf_path = match (&cli.pdf, &cli.url) {
        (Some(path), None) => path.clone(),
        (None, Some(url)) => {
            let dest = PathBuf::from("temp.pdf");
            download::download_pdf(url, &dest).await?;
            dest
        }
        _ => anyhow::bail!("Provide exactly one of --pdf or --url"),
    };

    let outcome = pipeline::process_pdf(&pdf_path, &cli.output, &config)?;
    let zip_path = archive::bundle_results(&cli.output, &pdf_path)?;

    info!(
        json = %outcome.json_path.display(),
        text = %outcome.text_path.display(),
        index = %outcome.index_dir.display(),
        zip = %zip_path.display(),
        "Done"
    );

    println!(
        "Processed {} ({} pages, {} via OCR); results in {}",
        outcome.report.source_file,
        outcome.report.stats.total_pages,
        outcome.report.stats.ocr_pages,
        zip_path.display()
    );

    Ok(())
}

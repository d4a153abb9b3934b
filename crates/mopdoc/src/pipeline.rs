//! End-to-end extraction: classify each page as digital or scanned, extract
//! text and tables, collect form fields, write the report artifacts, and
//! build the search index.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::processing::layout::{render_grid, words_to_grid};
use crate::processing::tables::{detect_tables, tables_to_grids, write_page_tables};
use crate::processing::{approx_accuracy, round2, OcrEngine, PdfExtractor};
use crate::search::{ContentIndex, DOCUMENT_ID, INDEX_DIR_NAME};
use crate::types::{DocumentStats, ExtractionReport, PageContent, PdfMetadata};

/// Paths and data produced by a pipeline run.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub report: ExtractionReport,
    pub json_path: PathBuf,
    pub text_path: PathBuf,
    pub index_dir: PathBuf,
}

/// Process a PDF into `output_dir`: `resultado.json`, `resultado.txt`,
/// per-page table sidecars, and a `tantivy_index/` over the global text.
pub fn process_pdf(
    pdf_path: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<ProcessOutcome> {
    if !pdf_path.exists() {
        anyhow::bail!("Input PDF not found: {}", pdf_path.display());
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    tracing::info!(pdf = %pdf_path.display(), output = %output_dir.display(), "Processing PDF");

    let parsed = PdfExtractor::parse(pdf_path)?;
    if parsed.pages.is_empty() {
        anyhow::bail!("No pages were processed: {}", pdf_path.display());
    }

    let ocr_engine = OcrEngine::new(&config.language, config.ocr.dpi);

    let mut pages = Vec::with_capacity(parsed.pages.len());
    let mut global_text = Vec::with_capacity(parsed.pages.len());
    let mut ocr_pages = 0usize;
    let mut digital_pages = 0usize;

    for page in &parsed.pages {
        let page_number = page.page_number;
        let digital = page.text.trim();

        let (content, used_ocr) = if !digital.is_empty() {
            digital_pages += 1;

            let tables = detect_tables(digital, config.tables.min_rows, config.tables.cell_gap);
            let grids = tables_to_grids(&tables);
            write_page_tables(&grids, output_dir, page_number)?;

            (digital.to_string(), false)
        } else {
            ocr_pages += 1;
            tracing::info!(page = page_number, "No digital text, applying OCR");

            let words = ocr_engine
                .recognize_page(pdf_path, page_number)
                .with_context(|| format!("OCR failed for page {}", page_number))?;
            let grid = words_to_grid(&words, config.ocr.row_tolerance, config.ocr.column_gap);

            (render_grid(&grid, true), true)
        };

        pages.push(PageContent {
            page: page_number,
            text: content.clone(),
            ocr: used_ocr,
            approx_accuracy: approx_accuracy(&content),
        });
        global_text.push(content);
    }

    let total_pages = ocr_pages + digital_pages;
    let stats = DocumentStats {
        total_pages,
        ocr_pages,
        digital_pages,
        ocr_ratio: round2(ocr_pages as f64 / total_pages as f64),
    };

    let source_file = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let report = ExtractionReport {
        source_file,
        metadata: PdfMetadata {
            title: parsed.title.clone().unwrap_or_default(),
            author: parsed.author.clone().unwrap_or_default(),
            page_count: parsed.page_count(),
        },
        stats,
        pages,
        form_fields: parsed.form_fields.clone(),
    };

    let json_path = write_report_json(&report, output_dir)?;
    let text_path = write_report_text(&report, output_dir)?;
    let index_dir = build_search_index(&global_text, output_dir, config)?;

    tracing::info!(
        pages = report.stats.total_pages,
        ocr_pages = report.stats.ocr_pages,
        forms = report.form_fields.len(),
        "Extraction complete"
    );

    Ok(ProcessOutcome {
        report,
        json_path,
        text_path,
        index_dir,
    })
}

fn write_report_json(report: &ExtractionReport, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("resultado.json");
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn write_report_text(report: &ExtractionReport, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("resultado.txt");
    let body = report
        .pages
        .iter()
        .map(|p| format!("[Página {}]: {}", p.page, p.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    std::fs::write(&path, body)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn build_search_index(
    global_text: &[String],
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<PathBuf> {
    let index_dir = output_dir.join(INDEX_DIR_NAME);
    let index = ContentIndex::create(&index_dir, config.search.writer_heap_bytes)?;
    index.add_document(DOCUMENT_ID, &global_text.join("\n"))?;
    index.commit()?;
    Ok(index_dir)
}

//! Scanned-page recognition via system binaries.
//!
//! Pages are rasterized with `pdftoppm` (poppler-utils) and recognized with
//! `tesseract` in TSV mode, which reports one word per row together with its
//! bounding box and confidence. The geometry feeds the layout module, which
//! rebuilds rows and columns from it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("{tool} not found — install {package} for OCR support")]
    MissingTool {
        tool: &'static str,
        package: &'static str,
    },
    #[error("pdftoppm failed on page {page}: {stderr}")]
    Render { page: usize, stderr: String },
    #[error("tesseract failed on page {page}: {stderr}")]
    Recognition { page: usize, stderr: String },
}

/// A recognized word with its bounding box, from tesseract's TSV output.
#[derive(Debug, Clone)]
pub struct OcrWord {
    pub text: String,
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
    pub conf: f32,
}

impl OcrWord {
    pub fn right(&self) -> i64 {
        self.left + self.width
    }
}

pub struct OcrEngine {
    language: String,
    dpi: u32,
}

impl OcrEngine {
    pub fn new(language: &str, dpi: u32) -> Self {
        Self {
            language: language.to_string(),
            dpi,
        }
    }

    /// Check whether both OCR tools respond on this system.
    pub fn is_available() -> bool {
        Self::ensure_available().is_ok()
    }

    pub fn ensure_available() -> Result<(), OcrError> {
        if Command::new("pdftoppm").arg("-v").output().is_err() {
            return Err(OcrError::MissingTool {
                tool: "pdftoppm",
                package: "poppler-utils",
            });
        }
        if Command::new("tesseract").arg("--version").output().is_err() {
            return Err(OcrError::MissingTool {
                tool: "tesseract",
                package: "tesseract-ocr",
            });
        }
        Ok(())
    }

    /// Rasterize one page of `pdf_path` and recognize it, returning the
    /// words with their geometry. `page` is 1-based.
    pub fn recognize_page(&self, pdf_path: &Path, page: usize) -> Result<Vec<OcrWord>> {
        Self::ensure_available()?;

        let temp_dir = tempfile::tempdir().context("Failed to create OCR scratch directory")?;
        let image_path = self.render_page(pdf_path, page, temp_dir.path())?;

        tracing::debug!(
            page = page,
            image = %image_path.display(),
            lang = %self.language,
            "Running tesseract"
        );

        let output = Command::new("tesseract")
            .arg(&image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .output()
            .with_context(|| format!("Failed to run tesseract on page {}", page))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(OcrError::Recognition { page, stderr }.into());
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let words = parse_tsv(&tsv);
        tracing::info!(page = page, words = words.len(), "OCR page recognized");
        Ok(words)
    }

    /// Render exactly one page to PNG with pdftoppm and return the image path.
    fn render_page(&self, pdf_path: &Path, page: usize, scratch: &Path) -> Result<PathBuf> {
        let prefix = scratch.join("page");

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .with_context(|| format!("Failed to run pdftoppm on page {}", page))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(OcrError::Render { page, stderr }.into());
        }

        // pdftoppm names the file page-<n>.png with zero padding that depends
        // on the document's page count, so take whatever single PNG it wrote.
        let image = std::fs::read_dir(scratch)
            .context("Failed to list OCR scratch directory")?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| p.extension().map(|ext| ext == "png").unwrap_or(false));

        image.ok_or_else(|| {
            OcrError::Render {
                page,
                stderr: "pdftoppm produced no image".to_string(),
            }
            .into()
        })
    }
}

/// Parse tesseract TSV output into words. Header rows, words with no text,
/// and rows with confidence -1 (layout markers, not words) are dropped.
fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
    let mut words = Vec::new();

    for line in tsv.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }

        let conf: f32 = match cols[10].parse() {
            Ok(c) => c,
            Err(_) => continue,
        };
        if conf < 0.0 {
            continue;
        }

        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        let (left, top, width, height) = match (
            cols[6].parse(),
            cols[7].parse(),
            cols[8].parse(),
            cols[9].parse(),
        ) {
            (Ok(l), Ok(t), Ok(w), Ok(h)) => (l, t, w, h),
            _ => continue,
        };

        words.push(OcrWord {
            text: text.to_string(),
            left,
            top,
            width,
            height,
            conf,
        });
    }

    words
}

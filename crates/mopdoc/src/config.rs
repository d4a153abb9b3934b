use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Tesseract language code used for scanned pages.
    pub language: String,
    pub ocr: OcrConfig,
    pub tables: TableConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Rasterization resolution handed to pdftoppm.
    pub dpi: u32,
    /// Words whose `top` differs by less than this many pixels share a row.
    pub row_tolerance: i64,
    /// Horizontal gap (px) between words that starts a new cell.
    pub column_gap: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Minimum consecutive aligned lines that count as a table.
    pub min_rows: usize,
    /// Run of spaces inside a line that separates two cells.
    pub cell_gap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub writer_heap_bytes: usize,
}

impl PipelineConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.language.trim().is_empty() {
            return Err("language must not be empty".into());
        }
        if !(72..=1200).contains(&self.ocr.dpi) {
            return Err("ocr.dpi must be in [72, 1200]".into());
        }
        if self.ocr.row_tolerance <= 0 {
            return Err("ocr.row_tolerance must be > 0".into());
        }
        if self.ocr.column_gap <= 0 {
            return Err("ocr.column_gap must be > 0".into());
        }
        if self.tables.min_rows < 2 {
            return Err("tables.min_rows must be >= 2".into());
        }
        if self.tables.cell_gap < 2 {
            return Err("tables.cell_gap must be >= 2".into());
        }
        if self.search.default_limit == 0 {
            return Err("search.default_limit must be > 0".into());
        }
        if self.search.writer_heap_bytes < 3_000_000 {
            return Err("search.writer_heap_bytes must be >= 3MB".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "spa".to_string(),
            ocr: OcrConfig {
                dpi: 300,
                row_tolerance: 10,
                column_gap: 60,
            },
            tables: TableConfig {
                min_rows: 2,
                cell_gap: 3,
            },
            search: SearchConfig {
                default_limit: 10,
                writer_heap_bytes: 50_000_000,
            },
        }
    }
}

//! Table detection on digital-text pages.
//!
//! Columnar layouts survive text extraction as runs of lines with large
//! internal whitespace gaps. Consecutive lines that all show the gap
//! signature are treated as one table; the gaps split each line into cells.
//! Detected tables are rendered as ASCII grids and persisted per page as a
//! JSON sidecar next to the main artifacts.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::processing::layout::{pad_rows, render_grid};
use crate::types::TableEntry;

/// Detect tables in a page's extracted text. Returns each table as rows of
/// cells, padded to the widest row.
///
/// A line belongs to a table when it splits into 2+ cells at runs of
/// `cell_gap` or more spaces; `min_rows` consecutive such lines form a table.
pub fn detect_tables(text: &str, min_rows: usize, cell_gap: usize) -> Vec<Vec<Vec<String>>> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        match split_cells(line, cell_gap) {
            Some(cells) => current.push(cells),
            None => {
                if current.len() >= min_rows {
                    let mut table = std::mem::take(&mut current);
                    pad_rows(&mut table);
                    tables.push(table);
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() >= min_rows {
        pad_rows(&mut current);
        tables.push(current);
    }

    tables
}

/// Split a line into cells at runs of `cell_gap`+ spaces. Returns `None`
/// when the line does not look tabular (fewer than two cells).
fn split_cells(line: &str, cell_gap: usize) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut spaces = 0usize;

    for ch in trimmed.chars() {
        if ch == ' ' {
            spaces += 1;
            continue;
        }
        if spaces >= cell_gap && !current.is_empty() {
            cells.push(std::mem::take(&mut current));
        } else if spaces > 0 && !current.is_empty() {
            current.push(' ');
        }
        spaces = 0;
        current.push(ch);
    }
    if !current.is_empty() {
        cells.push(current);
    }

    if cells.len() >= 2 {
        Some(cells)
    } else {
        None
    }
}

/// Render detected tables as ASCII grids, one string per table.
pub fn tables_to_grids(tables: &[Vec<Vec<String>>]) -> Vec<String> {
    tables
        .iter()
        .map(|rows| render_grid(rows, false))
        .filter(|g| !g.is_empty())
        .collect()
}

/// Write a page's rendered tables to `tablas_pag_<page>.json` in the output
/// directory. Returns `None` without touching the filesystem when the page
/// has no tables.
pub fn write_page_tables(
    grids: &[String],
    output_dir: &Path,
    page: usize,
) -> Result<Option<PathBuf>> {
    if grids.is_empty() {
        return Ok(None);
    }

    let entries: Vec<TableEntry> = grids
        .iter()
        .enumerate()
        .map(|(idx, grid)| TableEntry {
            table_num: idx + 1,
            lines: grid.lines().map(str::to_string).collect(),
        })
        .collect();

    let path = output_dir.join(format!("tablas_pag_{}.json", page));
    let json = serde_json::to_string_pretty(&entries).context("Failed to serialize tables")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(page = page, tables = entries.len(), path = %path.display(), "Page tables saved");
    Ok(Some(path))
}

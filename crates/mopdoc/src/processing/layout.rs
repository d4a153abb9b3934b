//! Spatial reconstruction of OCR output.
//!
//! Tesseract returns a flat word list with bounding boxes. Rows are rebuilt
//! by clustering words on their `top` coordinate, cells by splitting rows at
//! large horizontal gaps. The result is rendered as an ASCII grid so scanned
//! pages keep their visual structure in the text artifacts.

use crate::processing::ocr::OcrWord;

/// Group words into rows and cells using their bounding boxes.
///
/// Words whose `top` differs by less than `row_tolerance` share a row; inside
/// a row a horizontal gap larger than `column_gap` starts a new cell. Rows
/// are padded with empty cells to the widest row.
pub fn words_to_grid(words: &[OcrWord], row_tolerance: i64, column_gap: i64) -> Vec<Vec<String>> {
    if words.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&OcrWord> = words.iter().collect();
    sorted.sort_by_key(|w| w.top);

    let mut rows: Vec<Vec<&OcrWord>> = Vec::new();
    let mut current_row: Vec<&OcrWord> = Vec::new();
    let mut last_top: Option<i64> = None;

    for word in sorted {
        match last_top {
            None => current_row.push(word),
            Some(top) if (word.top - top).abs() < row_tolerance => current_row.push(word),
            Some(_) => {
                rows.push(std::mem::take(&mut current_row));
                current_row.push(word);
            }
        }
        last_top = Some(word.top);
    }
    if !current_row.is_empty() {
        rows.push(current_row);
    }

    let mut grid: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for mut row in rows {
        row.sort_by_key(|w| w.left);

        let mut cells: Vec<String> = Vec::new();
        let mut current_cell: Vec<&str> = vec![row[0].text.as_str()];
        let mut last_right = row[0].right();

        for word in &row[1..] {
            if word.left - last_right > column_gap {
                cells.push(current_cell.join(" "));
                current_cell = vec![word.text.as_str()];
            } else {
                current_cell.push(word.text.as_str());
            }
            last_right = word.right();
        }
        cells.push(current_cell.join(" "));
        grid.push(cells);
    }

    pad_rows(&mut grid);
    grid
}

/// Pad every row with empty cells up to the widest row.
pub fn pad_rows(rows: &mut [Vec<String>]) {
    let max_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in rows.iter_mut() {
        while row.len() < max_cols {
            row.push(String::new());
        }
    }
}

/// Render rows as an ASCII grid table.
///
/// With `synthetic_headers` a `Col1..ColN` header row is added and separated
/// from the body with `=`, matching the grid format of the text artifacts.
pub fn render_grid(rows: &[Vec<String>], synthetic_headers: bool) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if cols == 0 {
        return String::new();
    }

    let headers: Vec<String> = (1..=cols).map(|i| format!("Col{}", i)).collect();

    let mut widths = vec![0usize; cols];
    if synthetic_headers {
        for (i, h) in headers.iter().enumerate() {
            widths[i] = h.chars().count();
        }
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let border = |fill: char| {
        let mut line = String::from("+");
        for w in &widths {
            line.push_str(&fill.to_string().repeat(w + 2));
            line.push('+');
        }
        line
    };

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (i, w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = w - cell.chars().count();
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad + 1));
            line.push('|');
        }
        line
    };

    let mut out = Vec::new();
    out.push(border('-'));
    if synthetic_headers {
        out.push(render_row(&headers));
        out.push(border('='));
    }
    for row in rows {
        out.push(render_row(row));
        out.push(border('-'));
    }
    out.join("\n")
}

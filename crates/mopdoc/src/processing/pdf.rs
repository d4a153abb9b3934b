//! PDF loading: per-page digital text, document metadata, and form fields.
//!
//! Extraction is layered: pdf-extract gives the best text quality when the
//! page carries a proper text layer; lopdf content stream parsing is the
//! fallback for documents pdf-extract cannot handle. Pages that yield no
//! text either way are treated as scanned and handed to OCR by the caller.

use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

use crate::types::FormFieldEntry;

/// Parsed PDF with per-page text, metadata, and the form fields found on
/// each page's widget annotations.
#[derive(Debug, Clone)]
pub struct ParsedPdf {
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Vec<ParsedPage>,
    pub form_fields: Vec<FormFieldEntry>,
}

#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// 1-based page number.
    pub page_number: usize,
    /// Digital text layer, empty for scanned pages.
    pub text: String,
}

impl ParsedPdf {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn parse(path: &Path) -> Result<ParsedPdf> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read PDF: {}", path.display()))?;
        Self::parse_bytes(&bytes)
    }

    pub fn parse_bytes(bytes: &[u8]) -> Result<ParsedPdf> {
        let doc = Document::load_mem(bytes).context("Failed to load PDF")?;

        let title = Self::info_entry(&doc, b"Title");
        let author = Self::info_entry(&doc, b"Author");

        // Layer 1: pdf-extract per-page text. Errors here are non-fatal,
        // lopdf content streams cover whatever it could not read.
        let extracted_pages: Vec<String> = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map(|pages| pages.into_iter().map(|p| clean_page_text(&p)).collect())
            .unwrap_or_default();

        let page_ids: Vec<ObjectId> = doc.get_pages().values().cloned().collect();
        let mut pages = Vec::with_capacity(page_ids.len());
        let mut form_fields = Vec::new();

        for (i, &page_id) in page_ids.iter().enumerate() {
            let page_number = i + 1;

            let mut text = extracted_pages.get(i).cloned().unwrap_or_default();
            if text.trim().is_empty() {
                text = Self::page_stream_text(&doc, page_id).unwrap_or_default();
            }
            if text.trim().is_empty() {
                // Last digital resort before the caller reaches for OCR.
                text = doc
                    .extract_text(&[page_number as u32])
                    .map(|t| clean_page_text(&t))
                    .unwrap_or_default();
            }

            form_fields.extend(Self::page_widget_fields(&doc, page_id, page_number));

            pages.push(ParsedPage { page_number, text });
        }

        Ok(ParsedPdf {
            title,
            author,
            pages,
            form_fields,
        })
    }

    // ── Metadata ──────────────────────────────────────────────────────

    /// Read a text entry from the trailer's Info dictionary. The Info value
    /// may be inline or a reference; empty strings count as absent.
    fn info_entry(doc: &Document, key: &[u8]) -> Option<String> {
        let info = doc.trailer.get(b"Info").ok()?;
        let dict = deref_dict(doc, info)?;
        let bytes = dict.get(key).ok()?.as_str().ok()?;
        Some(decode_pdf_string(bytes)).filter(|s| !s.is_empty())
    }

    // ── Page text ─────────────────────────────────────────────────────

    fn page_stream_text(doc: &Document, page_id: ObjectId) -> Option<String> {
        let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
        let contents = page.get(b"Contents").ok()?;

        let mut text = String::new();
        Self::collect_stream_text(doc, contents, &mut text);
        Some(text)
    }

    /// Walk a Contents entry (stream, array of streams, or reference to
    /// either) and append the operator-level text of each stream.
    fn collect_stream_text(doc: &Document, contents: &Object, out: &mut String) {
        match contents {
            Object::Reference(id) => {
                if let Ok(target) = doc.get_object(*id) {
                    Self::collect_stream_text(doc, target, out);
                }
            }
            Object::Array(items) => {
                for item in items {
                    Self::collect_stream_text(doc, item, out);
                }
            }
            Object::Stream(stream) => {
                let decoded = stream
                    .decode_content()
                    .ok()
                    .and_then(|content| content.encode().ok());
                if let Some(bytes) = decoded {
                    out.push_str(&text_from_operators(&String::from_utf8_lossy(&bytes)));
                }
            }
            _ => {}
        }
    }

    // ── Form fields ───────────────────────────────────────────────────

    /// Collect the widget annotations of one page as form field entries.
    /// Field name (`T`) and value (`V`) may live on the widget itself or
    /// anywhere up its `Parent` chain in the AcroForm field tree.
    fn page_widget_fields(
        doc: &Document,
        page_id: ObjectId,
        page_number: usize,
    ) -> Vec<FormFieldEntry> {
        let annots = match Self::page_annotations(doc, page_id) {
            Some(a) => a,
            None => return Vec::new(),
        };

        let mut entries = Vec::new();
        for annot in annots {
            let dict = match deref_dict(doc, annot) {
                Some(d) => d,
                None => continue,
            };

            if dict_name(dict, b"Subtype").as_deref() != Some("Widget") {
                continue;
            }

            let name = field_attribute(doc, dict, b"T").unwrap_or_default();
            let value = field_attribute(doc, dict, b"V");
            if name.is_empty() && value.is_none() {
                continue;
            }

            entries.push(FormFieldEntry {
                page: page_number,
                name,
                value,
            });
        }
        entries
    }

    fn page_annotations(doc: &Document, page_id: ObjectId) -> Option<&Vec<Object>> {
        let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
        let annots = page.get(b"Annots").ok()?;
        match annots {
            Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok(),
            other => other.as_array().ok(),
        }
    }
}

// ── Dictionary helpers ───────────────────────────────────────────────

fn deref_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        other => other.as_dict().ok(),
    }
}

/// Read `key` from a field dictionary, walking up the `Parent` chain when
/// the widget itself does not carry it. Depth is capped in case a document
/// has a `Parent` cycle.
fn field_attribute(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let mut current = Some(dict);
    for _ in 0..32 {
        let d = current?;
        if let Some(value) = dict_text(d, key) {
            return Some(value);
        }
        current = d.get(b"Parent").ok().and_then(|p| deref_dict(doc, p));
    }
    None
}

/// A dictionary entry decoded as text. Covers both PDF strings and names,
/// since field values for buttons and choices are stored as names.
fn dict_text(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let decoded = match dict.get(key).ok()? {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        Object::Name(bytes) => decode_pdf_string(bytes),
        _ => return None,
    };
    Some(decoded).filter(|s| !s.is_empty())
}

fn dict_name(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

// ── Content stream text ──────────────────────────────────────────────

/// Pull the text shown by Tj and TJ operators out of a content stream,
/// flushing one output line per text block (ET).
fn text_from_operators(content: &str) -> String {
    let mut result = String::new();
    let mut block = String::new();

    let mut flush = |block: &mut String, result: &mut String| {
        if !block.is_empty() {
            result.push_str(block.trim());
            result.push('\n');
            block.clear();
        }
    };

    for raw in content.lines() {
        let line = raw.trim();

        if let Some(op) = line.strip_suffix("Tj") {
            if let Some(literal) = literal_between(op, '(', ')') {
                block.push_str(&unescape_pdf_string(literal));
                block.push(' ');
            }
        } else if let Some(op) = line.strip_suffix("TJ") {
            if let Some(array) = literal_between(op, '[', ']') {
                for part in array.split(')').filter(|s| !s.is_empty()) {
                    if let Some(open) = part.rfind('(') {
                        block.push_str(&unescape_pdf_string(&part[open + 1..]));
                    }
                }
                block.push(' ');
            }
        } else if line == "ET" {
            flush(&mut block, &mut result);
        }
    }

    if !block.is_empty() {
        result.push_str(block.trim());
    }
    result
}

/// The slice between the first `open` and the last `close`, if both exist
/// in that order.
fn literal_between(s: &str, open: char, close: char) -> Option<&str> {
    let start = s.find(open)?;
    let end = s.rfind(close)?;
    (end > start).then(|| &s[start + open.len_utf8()..end])
}

/// Normalize extracted page text: trim lines, drop empty ones.
fn clean_page_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── PDF string decoding ──────────────────────────────────────────────

/// Decode a PDF text string: UTF-16 (BE or LE, with or without BOM) first,
/// then UTF-8, with a lossy fallback for anything else.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, Endian::Big);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, Endian::Little);
    }

    // BOM-less UTF-16 shows up in the wild. Mostly-Latin text leaves one
    // null byte per code unit: at even offsets for BE, at odd offsets for LE.
    if bytes.len() >= 4 && bytes.len() % 2 == 0 {
        let nulls_at = |start: usize| {
            bytes
                .iter()
                .skip(start)
                .step_by(2)
                .filter(|&&b| b == 0)
                .count()
        };
        let (even_nulls, odd_nulls) = (nulls_at(0), nulls_at(1));
        if even_nulls > bytes.len() / 4 && even_nulls > odd_nulls {
            return decode_utf16(bytes, Endian::Big);
        }
        if odd_nulls > bytes.len() / 4 && odd_nulls > even_nulls {
            return decode_utf16(bytes, Endian::Little);
        }
    }

    String::from_utf8(bytes.to_vec())
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

#[derive(Clone, Copy)]
enum Endian {
    Big,
    Little,
}

fn decode_utf16(bytes: &[u8], endian: Endian) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| match endian {
            Endian::Big => u16::from_be_bytes([pair[0], pair[1]]),
            Endian::Little => u16::from_le_bytes([pair[0], pair[1]]),
        })
        .collect();

    String::from_utf16_lossy(&units)
        .chars()
        .filter(|&c| c != '\0' && (c >= ' ' || c == '\t' || c == '\n'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Unescape PDF string escapes (\n, \r, \t, \\, \(, \)).
fn unescape_pdf_string(s: &str) -> String {
    s.replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
        .replace("\\(", "(")
        .replace("\\)", ")")
        .replace("\\\\", "\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_passthrough() {
        assert_eq!(decode_pdf_string(b"Informe MOP"), "Informe MOP");
    }

    #[test]
    fn test_decode_utf16be_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x6F, 0x00, 0x6C, 0x00, 0x61];
        assert_eq!(decode_pdf_string(&bytes), "Hola");
    }

    #[test]
    fn test_decode_utf16le_without_bom() {
        let bytes = [0x48, 0x00, 0x6F, 0x00, 0x6C, 0x00, 0x61, 0x00];
        assert_eq!(decode_pdf_string(&bytes), "Hola");
    }

    #[test]
    fn test_decode_utf16be_without_bom() {
        let bytes = [0x00, 0x48, 0x00, 0x6F, 0x00, 0x6C, 0x00, 0x61];
        assert_eq!(decode_pdf_string(&bytes), "Hola");
    }

    #[test]
    fn test_text_from_operators_tj() {
        let content = "BT\n(Hola) Tj\n(mundo) Tj\nET\n";
        assert_eq!(text_from_operators(content), "Hola mundo\n");
    }

    #[test]
    fn test_text_from_operators_tj_array() {
        let content = "BT\n[(Ho) -20 (la)] TJ\nET\n";
        assert_eq!(text_from_operators(content), "Hola\n");
    }

    #[test]
    fn test_unescape_parens() {
        assert_eq!(unescape_pdf_string("a\\(b\\)c"), "a(b)c");
    }

    #[test]
    fn test_clean_page_text_drops_blank_lines() {
        assert_eq!(clean_page_text("  uno  \n\n   \n dos"), "uno\ndos");
    }
}

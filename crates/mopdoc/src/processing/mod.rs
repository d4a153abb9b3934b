pub mod layout;
pub mod ocr;
pub mod pdf;
pub mod tables;

pub use ocr::{OcrEngine, OcrError, OcrWord};
pub use pdf::{ParsedPdf, PdfExtractor};

/// Approximate accuracy of extracted text: the share of alphanumeric
/// characters in the trimmed content, rounded to 2 decimals. Empty or
/// whitespace-only text scores 0.
pub fn approx_accuracy(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let total = trimmed.chars().count();
    let alphanumeric = trimmed.chars().filter(|c| c.is_alphanumeric()).count();

    round2(alphanumeric as f64 / total as f64)
}

/// Round to 2 decimal places, the precision used in the report.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

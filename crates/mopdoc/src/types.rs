use serde::{Deserialize, Serialize};

/// Final report written to `resultado.json`. The serialized key names are the
/// wire format consumed by downstream tooling and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    #[serde(rename = "archivo_procesado")]
    pub source_file: String,
    #[serde(rename = "metadata_pdf")]
    pub metadata: PdfMetadata,
    #[serde(rename = "estadisticas")]
    pub stats: DocumentStats,
    #[serde(rename = "contenido_paginas")]
    pub pages: Vec<PageContent>,
    #[serde(rename = "formularios")]
    pub form_fields: Vec<FormFieldEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfMetadata {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "autor")]
    pub author: String,
    #[serde(rename = "num_paginas")]
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStats {
    #[serde(rename = "paginas_totales")]
    pub total_pages: usize,
    #[serde(rename = "paginas_con_ocr")]
    pub ocr_pages: usize,
    #[serde(rename = "paginas_texto_digital")]
    pub digital_pages: usize,
    pub ocr_ratio: f64,
}

/// Per-page extraction outcome: the text content (digital or OCR grid),
/// whether OCR was applied, and the approximate accuracy of the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(rename = "pagina")]
    pub page: usize,
    #[serde(rename = "texto")]
    pub text: String,
    pub ocr: bool,
    #[serde(rename = "precision_aproximada")]
    pub approx_accuracy: f64,
}

/// A form field (AcroForm widget) found on a page. `value` is `null` for
/// fields that exist but were never filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormFieldEntry {
    #[serde(rename = "pagina")]
    pub page: usize,
    #[serde(rename = "campo_name")]
    pub name: String,
    #[serde(rename = "campo_value")]
    pub value: Option<String>,
}

/// One extracted table, serialized per page into `tablas_pag_<n>.json`.
/// `lines` holds the rendered ASCII grid split into lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    #[serde(rename = "tabla_num")]
    pub table_num: usize,
    #[serde(rename = "contenido")]
    pub lines: Vec<String>,
}

//! End-to-end pipeline tests over small PDFs authored with lopdf.
//! OCR is not exercised here: fixture pages carry a digital text layer, so
//! the pipeline never needs the system binaries.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;

use mopdoc::search::{ContentIndex, DOCUMENT_ID, INDEX_DIR_NAME};
use mopdoc::types::{ExtractionReport, TableEntry};
use mopdoc::{pipeline, PipelineConfig};

/// Build a PDF where each element of `pages` is one page; lines within a
/// page become separate text blocks stacked top to bottom.
fn build_pdf(pages: &[&str]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page_text in pages {
        let mut operations = Vec::new();
        for (i, line) in page_text.lines().enumerate() {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), (700 - 20 * i as i64).into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content stream"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save_pdf(doc: &mut Document, dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    doc.save(&path).expect("save fixture PDF");
    path
}

#[test]
fn test_digital_pdf_produces_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = build_pdf(&[
        "Hola mundo desde la primera pagina",
        "Segunda pagina con mas contenido",
    ]);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Informe de Obras"),
        "Author" => Object::string_literal("MOP"),
    });
    doc.trailer.set("Info", info_id);

    let pdf_path = save_pdf(&mut doc, dir.path(), "informe.pdf");
    let output_dir = dir.path().join("resultado");

    let outcome =
        pipeline::process_pdf(&pdf_path, &output_dir, &PipelineConfig::default()).unwrap();

    // Report content
    let report = &outcome.report;
    assert_eq!(report.source_file, "informe.pdf");
    assert_eq!(report.metadata.title, "Informe de Obras");
    assert_eq!(report.metadata.author, "MOP");
    assert_eq!(report.metadata.page_count, 2);
    assert_eq!(report.stats.total_pages, 2);
    assert_eq!(report.stats.digital_pages, 2);
    assert_eq!(report.stats.ocr_pages, 0);
    assert_eq!(report.stats.ocr_ratio, 0.0);
    assert!(report.pages[0].text.contains("Hola"));
    assert!(!report.pages[0].ocr);
    assert!(report.pages[0].approx_accuracy > 0.5);

    // JSON artifact keeps the wire format keys
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&outcome.json_path).unwrap()).unwrap();
    assert!(raw.get("archivo_procesado").is_some());
    assert!(raw["estadisticas"].get("paginas_texto_digital").is_some());
    assert_eq!(raw["contenido_paginas"][0]["pagina"], 1);

    // The JSON round-trips into the typed report
    let parsed: ExtractionReport =
        serde_json::from_str(&std::fs::read_to_string(&outcome.json_path).unwrap()).unwrap();
    assert_eq!(parsed.stats.total_pages, 2);

    // Text artifact format
    let text = std::fs::read_to_string(&outcome.text_path).unwrap();
    assert!(text.starts_with("[Página 1]: "));
    assert!(text.contains("[Página 2]: "));

    // Search index is usable from a fresh handle
    assert_eq!(outcome.index_dir, output_dir.join(INDEX_DIR_NAME));
    let index = ContentIndex::open(&outcome.index_dir).unwrap();
    let hits = index.search("Hola", 10).unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].id, DOCUMENT_ID);

    // Same through the output-level search helper
    let hits =
        mopdoc::search::search_output(&output_dir, "contenido", &PipelineConfig::default())
            .unwrap();
    assert_eq!(hits[0].id, DOCUMENT_ID);
}

#[test]
fn test_aligned_columns_produce_table_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = build_pdf(&[
        "Item       Cantidad    Precio\nCemento    10          1200\nArena      5           800",
    ]);
    let pdf_path = save_pdf(&mut doc, dir.path(), "precios.pdf");
    let output_dir = dir.path().join("resultado");

    pipeline::process_pdf(&pdf_path, &output_dir, &PipelineConfig::default()).unwrap();

    let sidecar = output_dir.join("tablas_pag_1.json");
    assert!(sidecar.exists(), "expected {} to be written", sidecar.display());

    let tables: Vec<TableEntry> =
        serde_json::from_str(&std::fs::read_to_string(&sidecar).unwrap()).unwrap();
    assert_eq!(tables[0].table_num, 1);
    assert!(tables[0].lines.iter().any(|l| l.contains("Cemento")));
}

#[test]
fn test_form_fields_reported_with_page_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = build_pdf(&["Solicitud de permiso"]);

    // Attach a filled text widget to page 1.
    let widget_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("nombre"),
        "V" => Object::string_literal("Juan Pérez"),
        "Rect" => vec![50.into(), 50.into(), 200.into(), 70.into()],
    });
    let page_id = doc.get_pages()[&1];
    doc.get_object_mut(page_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("Annots", vec![widget_id.into()]);

    let pdf_path = save_pdf(&mut doc, dir.path(), "formulario.pdf");
    let output_dir = dir.path().join("resultado");

    let outcome =
        pipeline::process_pdf(&pdf_path, &output_dir, &PipelineConfig::default()).unwrap();

    assert_eq!(outcome.report.form_fields.len(), 1);
    let field = &outcome.report.form_fields[0];
    assert_eq!(field.page, 1);
    assert_eq!(field.name, "nombre");
    assert_eq!(field.value.as_deref(), Some("Juan Pérez"));
}

#[test]
fn test_missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = pipeline::process_pdf(
        Path::new("archivo_inexistente.pdf"),
        &dir.path().join("salida"),
        &PipelineConfig::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_pdf_without_pages_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = build_pdf(&[]);
    let pdf_path = save_pdf(&mut doc, dir.path(), "vacio.pdf");

    let err = pipeline::process_pdf(
        &pdf_path,
        &dir.path().join("salida"),
        &PipelineConfig::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("No pages"));
}

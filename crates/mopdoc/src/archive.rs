//! Result packaging: copy the source PDF next to the artifacts and bundle
//! everything into `resultado.zip`.

use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::search::INDEX_DIR_NAME;

/// Bundle the artifacts of a finished run into a zip placed next to the
/// output directory. The json, text, and PDF entries are flat; the search
/// index keeps its directory prefix.
pub fn bundle_results(output_dir: &Path, source_pdf: &Path) -> Result<PathBuf> {
    let original_pdf = output_dir.join("original.pdf");
    std::fs::copy(source_pdf, &original_pdf)
        .with_context(|| format!("Failed to copy {} into the output", source_pdf.display()))?;

    let zip_path = zip_destination(output_dir);
    let file = File::create(&zip_path)
        .with_context(|| format!("Failed to create {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for name in ["resultado.json", "resultado.txt", "original.pdf"] {
        let path = output_dir.join(name);
        if !path.exists() {
            anyhow::bail!("Missing artifact for packaging: {}", path.display());
        }
        zip.start_file(name, options)?;
        io::copy(&mut File::open(&path)?, &mut zip)
            .with_context(|| format!("Failed to add {} to the bundle", name))?;
    }

    let index_dir = output_dir.join(INDEX_DIR_NAME);
    if index_dir.is_dir() {
        for entry in WalkDir::new(&index_dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(output_dir)
                .context("Index entry outside the output directory")?;
            zip.start_file(relative.to_string_lossy().replace('\\', "/"), options)?;
            io::copy(&mut File::open(entry.path())?, &mut zip)
                .with_context(|| format!("Failed to add {} to the bundle", relative.display()))?;
        }
    }

    zip.finish().context("Failed to finalize the bundle")?;
    tracing::info!(path = %zip_path.display(), "Results packaged");
    Ok(zip_path)
}

/// The bundle always lands as `resultado.zip` in the output directory's
/// parent, regardless of what the output directory is called.
fn zip_destination(output_dir: &Path) -> PathBuf {
    output_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("resultado.zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_contains_flat_artifacts_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("resultado");
        std::fs::create_dir_all(output_dir.join(INDEX_DIR_NAME)).unwrap();

        std::fs::write(output_dir.join("resultado.json"), "{}").unwrap();
        std::fs::write(output_dir.join("resultado.txt"), "[Página 1]: hola").unwrap();
        std::fs::write(output_dir.join(INDEX_DIR_NAME).join("meta.json"), "{}").unwrap();

        let source_pdf = dir.path().join("doc.pdf");
        std::fs::write(&source_pdf, b"%PDF-1.4 fake").unwrap();

        let zip_path = bundle_results(&output_dir, &source_pdf).unwrap();
        assert_eq!(zip_path, dir.path().join("resultado.zip"));

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();

        assert!(names.contains(&"resultado.json".to_string()));
        assert!(names.contains(&"resultado.txt".to_string()));
        assert!(names.contains(&"original.pdf".to_string()));
        assert!(names.contains(&format!("{}/meta.json", INDEX_DIR_NAME)));
    }

    #[test]
    fn test_bundle_fails_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("resultado");
        std::fs::create_dir_all(&output_dir).unwrap();

        let source_pdf = dir.path().join("doc.pdf");
        std::fs::write(&source_pdf, b"%PDF-1.4 fake").unwrap();

        let err = bundle_results(&output_dir, &source_pdf).unwrap_err();
        assert!(err.to_string().contains("resultado.json"));
    }
}

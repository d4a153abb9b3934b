use anyhow::{Context, Result};
use std::path::Path;

/// Download a PDF over HTTP(S) and write it to `dest`.
///
/// Nothing is written unless the server answers with a success status.
pub async fn download_pdf(url: &str, dest: &Path) -> Result<()> {
    tracing::info!(url = %url, "Downloading PDF");

    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("Could not download PDF from {}: HTTP {}", url, status);
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read PDF response body")?;

    std::fs::write(dest, &bytes)
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    tracing::info!(path = %dest.display(), bytes = bytes.len(), "PDF downloaded");
    Ok(())
}

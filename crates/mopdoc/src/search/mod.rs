pub mod text_search;

pub use text_search::{ContentIndex, SearchHit};

use anyhow::Result;
use std::path::Path;

use crate::config::PipelineConfig;

/// Directory name of the tantivy index inside the output directory.
pub const INDEX_DIR_NAME: &str = "tantivy_index";

/// Id under which the document's global text is indexed.
pub const DOCUMENT_ID: &str = "documento_pdf";

/// Query the index of a finished run. Opens `<output>/tantivy_index` and
/// returns up to `search.default_limit` hits.
pub fn search_output(
    output_dir: &Path,
    query: &str,
    config: &PipelineConfig,
) -> Result<Vec<SearchHit>> {
    let index = ContentIndex::open(&output_dir.join(INDEX_DIR_NAME))?;
    index.search(query, config.search.default_limit)
}

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{self, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Full-text index over the extracted document content.
///
/// Schema mirrors the report pipeline's needs: `id` is STRING (indexed, not
/// tokenized) and stored so hits can be mapped back; `content` is tokenized
/// but not stored, the text artifacts already carry it.
pub struct ContentIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    id_field: schema::Field,
    content_field: schema::Field,
}

/// A search hit: stored document id and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

impl ContentIndex {
    fn build_schema() -> (Schema, schema::Field, schema::Field) {
        let mut builder = Schema::builder();
        let id_field = builder.add_text_field("id", STRING | STORED);
        let content_field = builder.add_text_field("content", TEXT);
        (builder.build(), id_field, content_field)
    }

    /// Create a fresh index in `dir`, replacing any previous one.
    pub fn create(dir: &Path, writer_heap_bytes: usize) -> Result<Self> {
        if dir.exists() {
            std::fs::remove_dir_all(dir)
                .with_context(|| format!("Failed to clear stale index at {}", dir.display()))?;
        }
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create index directory {}", dir.display()))?;

        let (schema, id_field, content_field) = Self::build_schema();
        let index = Index::create_in_dir(dir, schema).context("Failed to create index")?;
        Self::with_index(index, id_field, content_field, writer_heap_bytes)
    }

    /// Open an existing index directory for searching.
    pub fn open(dir: &Path) -> Result<Self> {
        let (_, id_field, content_field) = Self::build_schema();
        let index = Index::open_in_dir(dir)
            .with_context(|| format!("Failed to open index at {}", dir.display()))?;
        Self::with_index(index, id_field, content_field, WRITER_HEAP_BYTES)
    }

    fn with_index(
        index: Index,
        id_field: schema::Field,
        content_field: schema::Field,
        writer_heap_bytes: usize,
    ) -> Result<Self> {
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .context("Failed to create index reader")?;
        let writer = index
            .writer(writer_heap_bytes)
            .context("Failed to create index writer")?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            id_field,
            content_field,
        })
    }

    pub fn add_document(&self, id: &str, content: &str) -> Result<()> {
        self.writer.lock().add_document(doc!(
            self.id_field => id,
            self.content_field => content,
        ))?;
        Ok(())
    }

    pub fn commit(&self) -> Result<()> {
        self.writer.lock().commit().context("Index commit failed")?;
        self.reader.reload()?;
        Ok(())
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.content_field]);

        let parsed = match parser.parse_query(query) {
            Ok(q) => q,
            Err(_) => {
                // Queries with stray syntax characters fall back to a phrase.
                let phrase = format!("\"{}\"", query.replace('"', ""));
                parser.parse_query(&phrase)?
            }
        };

        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(limit))?;

        let hits = top_docs
            .into_iter()
            .filter_map(|(score, address)| {
                let stored: TantivyDocument = searcher.doc(address).ok()?;
                let id = stored.get_first(self.id_field)?.as_str()?;
                Some(SearchHit {
                    id: id.to_string(),
                    score,
                })
            })
            .collect();

        Ok(hits)
    }

    pub fn doc_count(&self) -> usize {
        self.reader.searcher().num_docs() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("tantivy_index");

        let index = ContentIndex::create(&index_dir, WRITER_HEAP_BYTES).unwrap();
        index
            .add_document(
                "documento_pdf",
                "Este es un documento de prueba. Contiene información sobre OCR.",
            )
            .unwrap();
        index.commit().unwrap();

        let hits = index.search("prueba", 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].id, "documento_pdf");
    }

    #[test]
    fn test_reopen_existing_index() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("tantivy_index");

        {
            let index = ContentIndex::create(&index_dir, WRITER_HEAP_BYTES).unwrap();
            index
                .add_document("documento_pdf", "licitación de obras viales")
                .unwrap();
            index.commit().unwrap();
        }

        let reopened = ContentIndex::open(&index_dir).unwrap();
        assert_eq!(reopened.doc_count(), 1);
        let hits = reopened.search("licitación", 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_create_replaces_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("tantivy_index");

        {
            let index = ContentIndex::create(&index_dir, WRITER_HEAP_BYTES).unwrap();
            index
                .add_document("documento_pdf", "contenido antiguo")
                .unwrap();
            index.commit().unwrap();
        }

        let fresh = ContentIndex::create(&index_dir, WRITER_HEAP_BYTES).unwrap();
        assert_eq!(fresh.doc_count(), 0);
    }

    #[test]
    fn test_no_hits_for_absent_term() {
        let dir = tempfile::tempdir().unwrap();
        let index = ContentIndex::create(&dir.path().join("idx"), WRITER_HEAP_BYTES).unwrap();
        index
            .add_document("documento_pdf", "puente sobre el río")
            .unwrap();
        index.commit().unwrap();

        assert!(index.search("inexistente", 10).unwrap().is_empty());
    }
}

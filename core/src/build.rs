use rayon::prelude::*;
use std::time::Instant;

use crate::config::IndexConfig;
use crate::document::{index_document, DocumentSource};
use crate::error::{Error, Result};
use crate::index::SearchIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub id: String,
    pub reason: String,
}

/// What happened to each submitted document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub processed: usize,
    pub skipped: Vec<SkippedDocument>,
}

/// Index every source on a bounded worker pool, then aggregate.
///
/// Aggregation starts only after all workers are done, and document ids follow
/// the order of `sources`, not completion order. An unreadable document is
/// recorded in the report and left out; it never stops its siblings.
pub fn build_index<S: DocumentSource>(sources: &[S], config: &IndexConfig) -> Result<(SearchIndex, IndexReport)> {
    if sources.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    let start = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(config.workers.max(1)).build()?;
    let results: Vec<Result<_>> = pool.install(|| {
        sources
            .par_iter()
            .map(|src| index_document(src, config.max_word_length, &config.stopwords))
            .collect()
    });

    let mut report = IndexReport::default();
    let mut docs = Vec::with_capacity(results.len());
    for (src, result) in sources.iter().zip(results) {
        match result {
            Ok(terms) => docs.push(terms),
            Err(err) => {
                tracing::warn!(doc = src.id(), error = %err, "skipping document");
                report.skipped.push(SkippedDocument { id: src.id().to_string(), reason: err.to_string() });
            }
        }
    }
    if docs.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    report.processed = docs.len();

    let index = SearchIndex::aggregate(docs)?;
    tracing::info!(
        processed = report.processed,
        skipped = report.skipped.len(),
        num_terms = index.inverted.num_terms(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "indexing complete"
    );
    Ok((index, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FileDocument, TextDocument};

    #[test]
    fn empty_corpus_is_fatal() {
        let none: Vec<TextDocument> = Vec::new();
        assert!(matches!(build_index(&none, &IndexConfig::default()), Err(Error::EmptyCorpus)));
    }

    #[test]
    fn ids_follow_input_order_across_workers() {
        let docs: Vec<TextDocument> = (0..64).map(|i| TextDocument::new(format!("doc{i:02}"), format!("shared word{i}"))).collect();
        let config = IndexConfig { workers: 8, ..IndexConfig::default() };
        let (index, report) = build_index(&docs, &config).unwrap();
        assert_eq!(report.processed, 64);
        for (doc_id, meta) in index.catalog.iter() {
            assert_eq!(meta.external_id, format!("doc{doc_id:02}"));
        }
        assert_eq!(index.inverted.postings("shared").len(), 64);
    }

    #[test]
    fn unreadable_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "hello world").unwrap();
        let docs = vec![FileDocument::new(dir.path().join("missing.txt")), FileDocument::new(&good)];
        let (index, report) = build_index(&docs, &IndexConfig::default()).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].id.ends_with("missing.txt"));
        assert_eq!(index.num_docs(), 1);
        assert_eq!(index.inverted.postings("hello"), &[0]);
    }

    #[test]
    fn all_unreadable_is_empty_corpus() {
        let docs = vec![FileDocument::new("/no/such/file")];
        assert!(matches!(build_index(&docs, &IndexConfig::default()), Err(Error::EmptyCorpus)));
    }
}

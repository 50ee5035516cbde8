use std::sync::Arc;

use crate::config::SearchConfig;
use crate::error::QuerySyntaxError;
use crate::eval::{evaluate, DocSet};
use crate::index::SearchIndex;
use crate::query::QueryExpr;
use crate::rank::{rank, ScoredDoc};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub query: String,
    /// Human-readable resolved boolean logic.
    pub logic: String,
    pub terms: Vec<String>,
    /// Query terms the index has never seen; they match nothing.
    pub unknown_terms: Vec<String>,
    pub total_hits: usize,
    pub hits: Vec<ScoredDoc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryReport {
    pub query: String,
    pub result: Result<SearchOutcome, QuerySyntaxError>,
}

/// Answers queries against a shared, read-only index.
#[derive(Debug, Clone)]
pub struct Searcher {
    index: Arc<SearchIndex>,
    universe: DocSet,
    config: SearchConfig,
}

impl Searcher {
    pub fn new(index: Arc<SearchIndex>, config: SearchConfig) -> Self {
        let universe = index.universe();
        Self { index, universe, config }
    }

    pub fn index(&self) -> &SearchIndex { &self.index }
    pub fn config(&self) -> &SearchConfig { &self.config }

    pub fn search(&self, query: &str) -> Result<SearchOutcome, QuerySyntaxError> {
        self.search_with(query, &self.config)
    }

    pub fn search_with(&self, query: &str, config: &SearchConfig) -> Result<SearchOutcome, QuerySyntaxError> {
        let expr = QueryExpr::parse(query).inspect_err(|err| tracing::warn!(query, error = %err, "invalid query"))?;
        Ok(self.run(query, &expr, config))
    }

    /// Evaluate and rank an already compiled query.
    pub fn run(&self, query: &str, expr: &QueryExpr, config: &SearchConfig) -> SearchOutcome {
        let logic = expr.to_string();
        tracing::debug!(query, %logic, "resolved query");
        let terms = expr.terms();
        let matched = evaluate(expr, &self.index.inverted, &self.universe);
        let hits = rank(&matched, &terms, &self.index.weights, &self.index.inverted, config.scoring, config.limit);
        SearchOutcome {
            query: query.to_string(),
            logic,
            unknown_terms: terms.iter().filter(|t| !self.index.inverted.contains(t)).map(|t| t.to_string()).collect(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
            total_hits: matched.len(),
            hits,
        }
    }

    /// Run every non-blank line as its own query. A bad line only fails its own report.
    pub fn run_batch<I, S>(&self, lines: I) -> Vec<QueryReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|line| {
                let query = line.as_ref().trim();
                if query.is_empty() {
                    return None;
                }
                Some(QueryReport { query: query.to_string(), result: self.search(query) })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;
    use crate::{build_index, IndexConfig};

    fn searcher() -> Searcher {
        let docs = vec![
            TextDocument::new("A", "science"),
            TextDocument::new("B", "religion"),
            TextDocument::new("C", "science religion"),
        ];
        let (index, _) = build_index(&docs, &IndexConfig::default()).unwrap();
        Searcher::new(Arc::new(index), SearchConfig::default())
    }

    #[test]
    fn outcome_reports_logic_and_hits() {
        let s = searcher();
        let out = s.search("science AND religion").unwrap();
        assert_eq!(out.logic, "AND:(science,religion)");
        assert_eq!(out.total_hits, 1);
        assert_eq!(s.index().catalog.external_id(out.hits[0].doc_id), Some("C"));
        assert!(out.unknown_terms.is_empty());
    }

    #[test]
    fn unknown_terms_are_reported_not_failed() {
        let out = searcher().search("astrology").unwrap();
        assert_eq!(out.total_hits, 0);
        assert!(out.hits.is_empty());
        assert_eq!(out.unknown_terms, vec!["astrology"]);
    }

    #[test]
    fn batch_skips_blank_lines_and_isolates_errors() {
        let reports = searcher().run_batch(["science", "", "   ", "science AND", "NOT science"]);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].result.as_ref().unwrap().total_hits, 2);
        assert_eq!(reports[1].result, Err(QuerySyntaxError::UnexpectedEnd));
        assert_eq!(reports[2].result.as_ref().unwrap().total_hits, 1);
    }
}

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::ScoringMode;
use crate::eval::DocSet;
use crate::index::{InvertedIndex, WeightStore};
use crate::DocId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// log2(1 + N / (df + 1))
pub fn dampening(matched: usize, df: usize) -> f64 {
    (1.0 + matched as f64 / (df as f64 + 1.0)).log2()
}

/// Document frequency of `term` under the given mode.
pub fn document_frequency(term: &str, matched: &DocSet, inverted: &InvertedIndex, mode: ScoringMode) -> usize {
    let postings = inverted.postings(term);
    match mode {
        ScoringMode::Restricted => postings.iter().filter(|d| matched.contains(d)).count(),
        ScoringMode::CorpusWide => postings.len(),
    }
}

/// Score every matched document and keep the best `limit`.
///
/// score(d) = sum over query terms t of weight(d, t) * dampening(N, df(t)), N = |matched|.
/// Ties go to the lower document id.
pub fn rank(
    matched: &DocSet,
    terms: &BTreeSet<&str>,
    weights: &WeightStore,
    inverted: &InvertedIndex,
    mode: ScoringMode,
    limit: usize,
) -> Vec<ScoredDoc> {
    if matched.is_empty() || limit == 0 {
        return Vec::new();
    }
    let n = matched.len();
    let factors: Vec<(&str, f64)> = terms
        .iter()
        .map(|&t| (t, dampening(n, document_frequency(t, matched, inverted, mode))))
        .collect();

    let mut scored: Vec<ScoredDoc> = matched
        .iter()
        .map(|&doc_id| {
            let score = factors.iter().map(|&(t, factor)| weights.weight(doc_id, t) * factor).sum();
            ScoredDoc { doc_id, score }
        })
        .collect();
    scored.sort_by(compare);
    scored.truncate(limit);
    scored
}

fn compare(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StopWords;
    use crate::document::{index_document, TextDocument};
    use crate::eval::evaluate;
    use crate::index::SearchIndex;
    use crate::query::QueryExpr;

    fn build(texts: &[&str]) -> SearchIndex {
        let docs = texts
            .iter()
            .enumerate()
            .map(|(i, t)| index_document(&TextDocument::new(format!("d{i}"), *t), 15, &StopWords::none()).unwrap())
            .collect();
        SearchIndex::aggregate(docs).unwrap()
    }

    fn search(idx: &SearchIndex, q: &str, mode: ScoringMode, limit: usize) -> Vec<ScoredDoc> {
        let expr = QueryExpr::parse(q).unwrap();
        let matched = evaluate(&expr, &idx.inverted, &idx.universe());
        rank(&matched, &expr.terms(), &idx.weights, &idx.inverted, mode, limit)
    }

    #[test]
    fn dampening_formula() {
        assert_eq!(dampening(3, 2), 1.0);
        assert_eq!(dampening(0, 0), 0.0);
    }

    #[test]
    fn restricted_df_differs_from_corpus_df() {
        let idx = build(&["rare common", "common", "common", "common", "rare"]);
        assert_eq!(idx.inverted.doc_frequency("common"), 4);

        let restricted = search(&idx, "rare AND common", ScoringMode::Restricted, 10);
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted[0].doc_id, 0);
        let expected = 2.0 * 1.5f64.log2();
        assert!((restricted[0].score - expected).abs() < 1e-12);

        let global = search(&idx, "rare AND common", ScoringMode::CorpusWide, 10);
        let expected_global = (1.0 + 1.0 / 3.0f64).log2() + (1.0 + 1.0 / 5.0f64).log2();
        assert!((global[0].score - expected_global).abs() < 1e-12);
        assert!((restricted[0].score - global[0].score).abs() > 1e-3);
    }

    #[test]
    fn heavier_weight_ranks_first_and_ties_by_id() {
        let idx = build(&["cat", "cat cat cat cat", "cat", "dog"]);
        let hits = search(&idx, "cat", ScoringMode::Restricted, 10);
        let ids: Vec<DocId> = hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![1, 0, 2]);
        // weight 3.0 vs 1.0 with N = 3, df' = 3
        assert!((hits[0].score - 3.0 * dampening(3, 3)).abs() < 1e-12);
        assert_eq!(hits[1].score, hits[2].score);
    }

    #[test]
    fn limit_and_empty_match() {
        let idx = build(&["ant", "ant", "ant", "bee"]);
        assert_eq!(search(&idx, "ant", ScoringMode::Restricted, 2).len(), 2);
        assert!(search(&idx, "ant AND bee", ScoringMode::Restricted, 10).is_empty());
        assert!(search(&idx, "wasp", ScoringMode::Restricted, 10).is_empty());
    }

    #[test]
    fn negated_terms_contribute_nothing() {
        let idx = build(&["ant bee", "ant", "bee"]);
        let hits = search(&idx, "ant NOT bee", ScoringMode::Restricted, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 1);
        assert!((hits[0].score - dampening(1, 1)).abs() < 1e-12);
    }

    #[test]
    fn ranking_is_deterministic() {
        let idx = build(&["a1 xx yy", "xx yy yy", "yy xx", "xx", "yy"]);
        let first = search(&idx, "xx OR yy", ScoringMode::Restricted, 10);
        for _ in 0..5 {
            assert_eq!(search(&idx, "xx OR yy", ScoringMode::Restricted, 10), first);
        }
    }
}

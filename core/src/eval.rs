use std::collections::BTreeSet;

use crate::index::InvertedIndex;
use crate::query::QueryExpr;
use crate::DocId;

/// Ordered set of internal document ids.
pub type DocSet = BTreeSet<DocId>;

/// Resolve a query tree against the index. Unknown terms resolve to the empty set.
pub fn evaluate(expr: &QueryExpr, index: &InvertedIndex, universe: &DocSet) -> DocSet {
    match expr {
        QueryExpr::Term(term) => index.postings(term).iter().copied().collect(),
        QueryExpr::And(ops) => {
            let mut sets = ops.iter().map(|op| evaluate(op, index, universe));
            let Some(first) = sets.next() else { return DocSet::new() };
            sets.fold(first, |acc, set| {
                if acc.is_empty() {
                    acc
                } else {
                    acc.intersection(&set).copied().collect()
                }
            })
        }
        QueryExpr::Or(ops) => ops.iter().fold(DocSet::new(), |mut acc, op| {
            acc.extend(evaluate(op, index, universe));
            acc
        }),
        QueryExpr::Not(op) => {
            let excluded = evaluate(op, index, universe);
            universe.difference(&excluded).copied().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StopWords;
    use crate::document::{index_document, TextDocument};
    use crate::index::SearchIndex;

    fn corpus() -> SearchIndex {
        let docs = [("A", "science"), ("B", "religion"), ("C", "science religion")]
            .iter()
            .map(|(id, text)| index_document(&TextDocument::new(*id, *text), 15, &StopWords::none()).unwrap())
            .collect();
        SearchIndex::aggregate(docs).unwrap()
    }

    fn run<'a>(index: &'a SearchIndex, q: &str) -> Vec<&'a str> {
        let expr = QueryExpr::parse(q).unwrap();
        evaluate(&expr, &index.inverted, &index.universe())
            .into_iter()
            .filter_map(|d| index.catalog.external_id(d))
            .collect()
    }

    #[test]
    fn boolean_operators() {
        let idx = corpus();
        assert_eq!(run(&idx, "science AND religion"), vec!["C"]);
        assert_eq!(run(&idx, "science OR religion"), vec!["A", "B", "C"]);
        assert_eq!(run(&idx, "NOT science"), vec!["B"]);
        assert_eq!(run(&idx, "science religion"), run(&idx, "science AND religion"));
        assert_eq!(run(&idx, "science NOT religion"), vec!["A"]);
    }

    #[test]
    fn unknown_term_is_empty_not_error() {
        let idx = corpus();
        assert!(run(&idx, "astrology").is_empty());
        assert!(run(&idx, "science AND astrology").is_empty());
        assert_eq!(run(&idx, "science OR astrology"), vec!["A", "C"]);
        assert_eq!(run(&idx, "NOT astrology"), vec!["A", "B", "C"]);
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::StopWords;

lazy_static! {
    static ref EDGES: Regex = Regex::new(r"^[^\p{Alphabetic}]+|[^\p{Alphabetic}]+$").expect("valid regex");
}

/// Strip leading/trailing non-alphabetic characters and lowercase.
pub fn normalize_token(raw: &str) -> String {
    EDGES.replace_all(raw, "").to_lowercase()
}

/// Bring a query literal into the form the index stores it in. No length or stop-word filtering.
pub fn normalize_query_term(literal: &str) -> String {
    normalize_token(&literal.nfkc().collect::<String>())
}

/// Whether a normalized token survives length and stop-word filtering.
pub fn is_indexable(term: &str, max_word_length: usize, stopwords: &StopWords) -> bool {
    let len = term.chars().count();
    len > 1 && len <= max_word_length && !stopwords.contains(term)
}

/// Tokenize one line of text into filtered, lowercase terms (NFKC-normalized first).
pub fn tokenize(line: &str, max_word_length: usize, stopwords: &StopWords) -> Vec<String> {
    let normalized = line.nfkc().collect::<String>();
    normalized
        .split_whitespace()
        .map(normalize_token)
        .filter(|t| is_indexable(t, max_word_length, stopwords))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_edges_only() {
        assert_eq!(normalize_token("\"Hello,"), "hello");
        assert_eq!(normalize_token("(don't)"), "don't");
        assert_eq!(normalize_token("--42--"), "");
        assert_eq!(normalize_token("x2y"), "x2y");
    }

    #[test]
    fn query_terms_match_indexed_form() {
        assert_eq!(normalize_query_term("\u{FB01}sh"), "fish");
        assert_eq!(normalize_query_term("science,"), "science");
        assert_eq!(normalize_query_term("New York"), "new york");
        for t in tokenize("\u{FB01}sh SCIENCE, café", 15, &StopWords::none()) {
            assert_eq!(normalize_query_term(&t), t);
        }
    }

    #[test]
    fn basic_tokenize() {
        let t = tokenize("  The quick, BROWN fox!  ", 15, &StopWords::none());
        assert_eq!(t, vec!["the", "quick", "brown", "fox"]);
    }
}

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sift_core::persist::{load_index, IndexPaths};
use sift_core::{DocId, ScoredDoc, ScoringMode, SearchConfig, Searcher};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;
const SNIPPET_BEFORE: usize = 100;
const SNIPPET_AFTER: usize = 200;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
    #[serde(default)]
    pub scoring: Option<ScoringMode>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub logic: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub unknown_terms: Vec<String>,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub external_id: String,
    pub score: f64,
    pub snippet: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub query: String,
    pub error: String,
}

#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<Searcher>,
}

/// Load the index under `index_dir` and build the router around it.
/// `defaults` applies to requests that leave `k` or `scoring` out.
pub fn build_app(index_dir: &str, defaults: SearchConfig) -> Result<Router> {
    let (index, meta) = load_index(&IndexPaths::new(index_dir)).with_context(|| format!("loading index from {index_dir}"))?;
    tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, "index loaded");
    let searcher = Arc::new(Searcher::new(Arc::new(index), defaults));
    Ok(router(searcher))
}

pub fn router(searcher: Arc<Searcher>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(AppState { searcher })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let start = std::time::Instant::now();
    let defaults = state.searcher.config();
    let config = SearchConfig { limit: params.k.unwrap_or(defaults.limit).clamp(1, MAX_K), scoring: params.scoring.unwrap_or(defaults.scoring) };

    let outcome = state.searcher.search_with(&params.q, &config).map_err(|err| {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse { query: params.q.clone(), error: err.to_string() }))
    })?;

    let highlighter = term_pattern(&outcome.terms);
    let searcher = state.searcher.clone();
    let hits = outcome.hits;
    // snippets read source files; keep that off the async workers
    let results = tokio::task::spawn_blocking(move || collect_hits(&searcher, &hits, highlighter.as_ref()))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "snippet task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { query: params.q.clone(), error: "internal error".into() }))
        })?;

    Ok(Json(SearchResponse {
        query: outcome.query,
        logic: outcome.logic,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: outcome.total_hits,
        unknown_terms: outcome.unknown_terms,
        results,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let Some(meta) = state.searcher.index().catalog.get(doc_id) else {
        return Err((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))));
    };
    let mut obj = serde_json::json!({
        "doc_id": doc_id,
        "external_id": meta.external_id,
        "num_terms": meta.num_terms,
    });
    if let Some(path) = &meta.path {
        if let Ok(text) = tokio::fs::read_to_string(path).await {
            obj["text"] = serde_json::Value::String(text);
        }
    }
    Ok(Json(obj))
}

fn collect_hits(searcher: &Searcher, hits: &[ScoredDoc], highlighter: Option<&Regex>) -> Vec<SearchHit> {
    let catalog = &searcher.index().catalog;
    hits.iter()
        .filter_map(|hit| {
            let meta = catalog.get(hit.doc_id)?;
            let snippet = meta.path.as_deref().and_then(|p| snippet_from_file(p, highlighter));
            Some(SearchHit { doc_id: hit.doc_id, external_id: meta.external_id.clone(), score: hit.score, snippet })
        })
        .collect()
}

/// Case-insensitive whole-word matcher for any of the query terms.
fn term_pattern(terms: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = terms.iter().filter(|t| !t.trim().is_empty()).map(|t| regex::escape(t)).collect();
    if alternatives.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).case_insensitive(true).build().ok()
}

fn snippet_from_file(path: &str, pattern: Option<&Regex>) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    if text.is_empty() {
        return None;
    }
    let Some(pattern) = pattern else {
        return Some(text.chars().take(SNIPPET_AFTER).collect());
    };
    let snippet = match pattern.find(&text) {
        Some(m) => {
            let start = floor_boundary(&text, m.start().saturating_sub(SNIPPET_BEFORE));
            let end = floor_boundary(&text, (m.start() + SNIPPET_AFTER).min(text.len()));
            &text[start..end]
        }
        None => return Some(text.chars().take(SNIPPET_AFTER).collect()),
    };
    Some(pattern.replace_all(snippet, "<em>$0</em>").into_owned())
}

fn floor_boundary(s: &str, mut idx: usize) -> usize {
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_whole_words_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "Rust is great. Trusty rust.").unwrap();
        let pattern = term_pattern(&["rust".to_string()]);
        let snippet = snippet_from_file(path.to_str().unwrap(), pattern.as_ref()).unwrap();
        assert_eq!(snippet, "<em>Rust</em> is great. Trusty <em>rust</em>.");
    }

    #[test]
    fn boundary_never_splits_a_char() {
        let s = "héllo";
        assert_eq!(floor_boundary(s, 2), 1);
        assert_eq!(floor_boundary(s, 3), 3);
    }
}

pub mod build;
pub mod config;
pub mod document;
pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod query;
pub mod rank;
pub mod search;
pub mod tokenizer;

/// Internal document id, assigned sequentially in corpus order at aggregation time.
pub type DocId = u32;

pub use build::{build_index, IndexReport, SkippedDocument};
pub use config::{IndexConfig, ScoringMode, SearchConfig, StopWords};
pub use document::{DocumentSource, DocumentTerms, FileDocument, TermWeights, TextDocument};
pub use error::{Error, QuerySyntaxError, Result};
pub use eval::DocSet;
pub use index::{DocMeta, DocumentCatalog, InvertedIndex, SearchIndex, WeightStore};
pub use query::QueryExpr;
pub use rank::ScoredDoc;
pub use search::{QueryReport, SearchOutcome, Searcher};

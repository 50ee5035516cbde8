use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read document {doc}: {source}")]
    DocumentRead {
        doc: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid query syntax: {0}")]
    QuerySyntax(#[from] QuerySyntaxError),
    #[error("corpus contains no readable documents")]
    EmptyCorpus,
    #[error("document {0} appears more than once in the corpus")]
    DuplicateDocument(String),
    #[error("cannot start indexing workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("index store is inconsistent: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] bincode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failure to compile one query line. Positions are char offsets into the query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuerySyntaxError {
    #[error("empty query")]
    Empty,
    #[error("unexpected `{token}` at {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("unexpected end of query")]
    UnexpectedEnd,
    #[error("unclosed quote starting at {position}")]
    UnclosedQuote { position: usize },
    #[error("unbalanced parenthesis at {position}")]
    UnbalancedParen { position: usize },
    #[error("query nested too deeply at {position}")]
    TooDeep { position: usize },
    #[error("invalid character `{ch}` at {position}")]
    InvalidCharacter { ch: char, position: usize },
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use crate::config::StopWords;
use crate::error::{Error, Result};
use crate::tokenizer::tokenize;

/// Something the indexer can read text from, identified by a stable source id.
pub trait DocumentSource: Sync {
    fn id(&self) -> &str;
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>>;
    /// Location of the text on disk, when there is one.
    fn path(&self) -> Option<&Path> { None }
}

#[derive(Debug, Clone)]
pub struct FileDocument {
    pub id: String,
    pub path: PathBuf,
}

impl FileDocument {
    /// A file document identified by its own path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self { id: path.to_string_lossy().into_owned(), path }
    }
}

impl DocumentSource for FileDocument {
    fn id(&self) -> &str { &self.id }
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> { Ok(Box::new(BufReader::new(File::open(&self.path)?))) }
    fn path(&self) -> Option<&Path> { Some(&self.path) }
}

#[derive(Debug, Clone)]
pub struct TextDocument {
    pub id: String,
    pub text: String,
}

impl TextDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

impl DocumentSource for TextDocument {
    fn id(&self) -> &str { &self.id }
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> { Ok(Box::new(Cursor::new(self.text.as_bytes()))) }
}

/// term -> 1 + log2(rawCount). Only terms that occurred are present, so every weight is >= 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermWeights(HashMap<String, f64>);

impl TermWeights {
    pub fn from_counts(counts: HashMap<String, u32>) -> Self {
        Self(
            counts
                .into_iter()
                .filter(|(_, n)| *n > 0)
                .map(|(term, n)| (term, 1.0 + f64::from(n).log2()))
                .collect(),
        )
    }

    /// Weight of `term`, or 0 when the document never contained it.
    pub fn get(&self, term: &str) -> f64 { self.0.get(term).copied().unwrap_or(0.0) }
    pub fn contains(&self, term: &str) -> bool { self.0.contains_key(term) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ { self.0.keys().map(String::as_str) }
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ { self.0.iter().map(|(t, w)| (t.as_str(), *w)) }
}

/// Output of indexing a single document.
#[derive(Debug, Clone)]
pub struct DocumentTerms {
    pub id: String,
    pub path: Option<String>,
    pub weights: TermWeights,
}

/// Scan a whole document and compute its term weights. Touches nothing but the document itself.
pub fn index_document(source: &dyn DocumentSource, max_word_length: usize, stopwords: &StopWords) -> Result<DocumentTerms> {
    let read_err = |err: io::Error| Error::DocumentRead { doc: source.id().to_string(), source: err };
    let mut reader = source.open().map_err(read_err)?;
    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).map_err(read_err)? == 0 {
            break;
        }
        // non-UTF-8 bytes are replaced rather than failing the whole document
        let line = String::from_utf8_lossy(&buf);
        for term in tokenize(&line, max_word_length, stopwords) {
            *counts.entry(term).or_insert(0) += 1;
        }
    }
    Ok(DocumentTerms {
        id: source.id().to_string(),
        path: source.path().map(|p| p.to_string_lossy().into_owned()),
        weights: TermWeights::from_counts(counts),
    })
}

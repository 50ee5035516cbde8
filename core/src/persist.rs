use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::index::{DocumentCatalog, InvertedIndex, SearchIndex, WeightStore};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub max_word_length: usize,
    pub stopword_count: usize,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn describe(index: &SearchIndex, config: &IndexConfig) -> Self {
        Self {
            num_docs: index.num_docs() as u32,
            num_terms: index.inverted.num_terms() as u32,
            max_word_length: config.max_word_length,
            stopword_count: config.stopwords.len(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: FORMAT_VERSION,
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn catalog(&self) -> PathBuf { self.root.join("catalog.bin") }
    fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    fn weights(&self) -> PathBuf { self.root.join("weights.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn save_bin<T: Serialize>(path: PathBuf, value: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut f, value)?;
    f.flush()?;
    Ok(())
}

fn load_bin<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    let f = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(f)?)
}

pub fn save_catalog(paths: &IndexPaths, catalog: &DocumentCatalog) -> Result<()> { save_bin(paths.catalog(), catalog) }
pub fn load_catalog(paths: &IndexPaths) -> Result<DocumentCatalog> { load_bin(paths.catalog()) }
pub fn save_postings(paths: &IndexPaths, inverted: &InvertedIndex) -> Result<()> { save_bin(paths.postings(), inverted) }
pub fn load_postings(paths: &IndexPaths) -> Result<InvertedIndex> { load_bin(paths.postings()) }
pub fn save_weights(paths: &IndexPaths, weights: &WeightStore) -> Result<()> { save_bin(paths.weights(), weights) }
pub fn load_weights(paths: &IndexPaths) -> Result<WeightStore> { load_bin(paths.weights()) }

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

pub fn save_index(paths: &IndexPaths, index: &SearchIndex, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_catalog(paths, &index.catalog)?;
    save_postings(paths, &index.inverted)?;
    save_weights(paths, &index.weights)?;
    save_meta(paths, meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "index saved");
    Ok(())
}

/// Load and cross-check every part of a saved index.
pub fn load_index(paths: &IndexPaths) -> Result<(SearchIndex, MetaFile)> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::Corrupt(format!("unsupported index version {}", meta.version)));
    }
    let index = SearchIndex {
        catalog: load_catalog(paths)?,
        inverted: load_postings(paths)?,
        weights: load_weights(paths)?,
    };
    if index.num_docs() != meta.num_docs as usize {
        return Err(Error::Corrupt(format!("meta lists {} documents, catalog has {}", meta.num_docs, index.num_docs())));
    }
    index.validate()?;
    Ok((index, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;
    use crate::build_index;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("idx"));
        let config = IndexConfig::default();
        let docs = vec![TextDocument::new("a", "rust rust systems"), TextDocument::new("b", "systems")];
        let (index, _) = build_index(&docs, &config).unwrap();
        let meta = MetaFile::describe(&index, &config);
        save_index(&paths, &index, &meta).unwrap();

        let (loaded, loaded_meta) = load_index(&paths).unwrap();
        assert_eq!(loaded_meta, meta);
        assert_eq!(loaded.catalog.lookup("b"), Some(1));
        assert_eq!(loaded.inverted.postings("systems"), &[0, 1]);
        assert_eq!(loaded.weights.weight(0, "rust"), 2.0);
    }

    #[test]
    fn mismatched_meta_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let config = IndexConfig::default();
        let (index, _) = build_index(&[TextDocument::new("a", "word")], &config).unwrap();
        let mut meta = MetaFile::describe(&index, &config);
        meta.num_docs = 7;
        save_index(&paths, &index, &meta).unwrap();
        assert!(matches!(load_index(&paths), Err(Error::Corrupt(_))));
    }

    #[test]
    fn missing_store_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_index(&IndexPaths::new(dir.path())), Err(Error::Io(_))));
    }
}

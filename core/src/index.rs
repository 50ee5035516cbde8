use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::document::{DocumentTerms, TermWeights};
use crate::error::{Error, Result};
use crate::eval::DocSet;
use crate::DocId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub external_id: String,
    /// Path to the source text when it came from disk, used for snippets.
    pub path: Option<String>,
    pub num_terms: u32,
}

/// Bijection between internal ids and source identifiers. Immutable once built.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DocumentCatalog {
    docs: Vec<DocMeta>,
    by_external: HashMap<String, DocId>,
}

impl DocumentCatalog {
    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
    pub fn get(&self, doc_id: DocId) -> Option<&DocMeta> { self.docs.get(doc_id as usize) }
    pub fn external_id(&self, doc_id: DocId) -> Option<&str> { self.get(doc_id).map(|m| m.external_id.as_str()) }
    pub fn lookup(&self, external_id: &str) -> Option<DocId> { self.by_external.get(external_id).copied() }
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &DocMeta)> + '_ {
        self.docs.iter().enumerate().map(|(i, m)| (i as DocId, m))
    }

    fn push(&mut self, meta: DocMeta) -> Result<DocId> {
        if self.by_external.contains_key(&meta.external_id) {
            return Err(Error::DuplicateDocument(meta.external_id));
        }
        let doc_id = self.docs.len() as DocId;
        self.by_external.insert(meta.external_id.clone(), doc_id);
        self.docs.push(meta);
        Ok(doc_id)
    }
}

/// term -> postings. Postings are ascending, duplicate-free and never empty.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<DocId>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Postings for `term`; empty for a term the index has never seen.
    pub fn postings(&self, term: &str) -> &[DocId] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, term: &str) -> bool { self.postings.contains_key(term) }
    pub fn doc_frequency(&self, term: &str) -> usize { self.postings(term).len() }
    pub fn num_terms(&self) -> usize { self.postings.len() }
    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ { self.postings.keys().map(String::as_str) }

    fn register(&mut self, term: &str, doc_id: DocId) {
        match self.postings.get_mut(term) {
            Some(list) => list.push(doc_id),
            None => {
                self.postings.insert(term.to_string(), vec![doc_id]);
            }
        }
    }
}

/// Per-document term weights, indexed by internal id.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct WeightStore(Vec<TermWeights>);

impl WeightStore {
    pub fn weight(&self, doc_id: DocId, term: &str) -> f64 {
        self.0.get(doc_id as usize).map_or(0.0, |w| w.get(term))
    }
    pub fn document(&self, doc_id: DocId) -> Option<&TermWeights> { self.0.get(doc_id as usize) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Everything a query needs: built once, read-only afterwards.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SearchIndex {
    pub catalog: DocumentCatalog,
    pub inverted: InvertedIndex,
    pub weights: WeightStore,
}

impl SearchIndex {
    /// Merge per-document results into the global index. Ids follow input order.
    pub fn aggregate(docs: Vec<DocumentTerms>) -> Result<Self> {
        let mut index = Self::default();
        for doc in docs {
            let doc_id = index.catalog.push(DocMeta {
                external_id: doc.id,
                path: doc.path,
                num_terms: doc.weights.len() as u32,
            })?;
            // a document lands in a term's postings once, whatever its raw count
            let mut terms: Vec<&str> = doc.weights.terms().collect();
            terms.sort_unstable();
            for term in terms {
                index.inverted.register(term, doc_id);
            }
            index.weights.0.push(doc.weights);
        }
        Ok(index)
    }

    pub fn num_docs(&self) -> usize { self.catalog.len() }

    /// All known document ids.
    pub fn universe(&self) -> DocSet { (0..self.num_docs() as DocId).collect() }

    /// Check the structural invariants of an index that came from outside this process.
    pub fn validate(&self) -> Result<()> {
        if self.weights.len() != self.catalog.len() {
            return Err(Error::Corrupt(format!(
                "{} weight entries for {} documents",
                self.weights.len(),
                self.catalog.len()
            )));
        }
        let catalog = &self.catalog;
        if catalog.by_external.len() != catalog.docs.len() {
            return Err(Error::Corrupt(format!(
                "{} source ids for {} documents",
                catalog.by_external.len(),
                catalog.docs.len()
            )));
        }
        for (doc_id, meta) in catalog.iter() {
            if catalog.lookup(&meta.external_id) != Some(doc_id) {
                return Err(Error::Corrupt(format!("source {:?} does not map back to document {doc_id}", meta.external_id)));
            }
        }

        let n = self.num_docs() as DocId;
        let mut pairs = 0usize;
        for (term, list) in &self.inverted.postings {
            if list.is_empty() {
                return Err(Error::Corrupt(format!("term {term:?} has empty postings")));
            }
            if list.windows(2).any(|w| w[0] >= w[1]) || list.last().is_some_and(|&d| d >= n) {
                return Err(Error::Corrupt(format!("term {term:?} has malformed postings")));
            }
            if let Some(&doc_id) = list.iter().find(|&&d| !self.weights.0[d as usize].contains(term)) {
                return Err(Error::Corrupt(format!("term {term:?} lists document {doc_id} without a weight")));
            }
            pairs += list.len();
        }
        // every weighted term must also be posted
        let weighted: usize = self.weights.0.iter().map(TermWeights::len).sum();
        if weighted != pairs {
            return Err(Error::Corrupt(format!("{weighted} weighted terms but {pairs} postings")));
        }
        Ok(())
    }
}

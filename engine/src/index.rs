use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::tf::TermFrequency;
use crate::{DocId, ScopeId, ScopeKind, Term};

/// One entry of a scope's inverted index: a document containing the term,
/// with the TF-IDF values as of the last write that touched this term.
///
/// `tf` is copied from the document's own table so the fan-out refresh is a
/// direct multiply; `idf`/`tfidf` are the write-path cached values and are
/// only meaningful within the scope that owns this posting list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: f64,
    pub idf: f64,
    pub tfidf: f64,
}

/// All mutable state of one scope: membership, the DF map, and the posting
/// lists. DF and the member count are owned here and only ever mutated
/// inside the updater's critical section (the engine serializes writers per
/// scope); `version` bumps on each successful indexation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeState {
    pub kind: ScopeKind,
    pub members: BTreeSet<DocId>,
    /// term -> number of distinct member documents containing it.
    pub df: HashMap<Term, u32>,
    /// term -> postings, sorted by doc_id (BTreeSet order of insertion).
    pub postings: HashMap<Term, Vec<Posting>>,
    pub version: u64,
}

impl ScopeState {
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            members: BTreeSet::new(),
            df: HashMap::new(),
            postings: HashMap::new(),
            version: 0,
        }
    }

    pub fn document_count(&self) -> u32 {
        self.members.len() as u32
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.members.contains(doc_id)
    }

    /// Distinct member documents containing the term, via the posting list.
    pub fn documents_containing(&self, term: &str) -> Vec<DocId> {
        self.postings
            .get(term)
            .map(|ps| ps.iter().map(|p| p.doc_id.clone()).collect())
            .unwrap_or_default()
    }
}

/// A document's immutable record: owning corpus, creation time, and the term
/// frequency table computed once from its text. Append-only; two writers
/// never mutate the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub corpus: ScopeId,
    pub terms: HashMap<Term, TermFrequency>,
    /// Unix timestamp (seconds) of indexation.
    pub created_at: u64,
}

impl DocumentRecord {
    pub fn new(corpus: ScopeId, terms: HashMap<Term, TermFrequency>) -> Self {
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self { corpus, terms, created_at }
    }

    /// Total tokens in the document (sum of raw frequencies).
    pub fn total_terms(&self) -> u64 {
        self.terms.values().map(|e| e.frequency as u64).sum()
    }
}

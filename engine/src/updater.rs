use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::index::{Posting, ScopeState};
use crate::tf::TermFrequency;
use crate::{DocId, IdfMode, ScopeId, Term};

/// Apply one new document to a scope's index: DF increments for the
/// document's distinct terms, membership registration, IDF recomputation for
/// exactly the affected terms, and the fan-out refresh of every posting of
/// those terms.
///
/// The caller holds the scope's write lock for the whole call, so readers
/// never observe DF incremented without the matching fan-out. Validation
/// runs before any mutation: on `InconsistentState` nothing has changed.
///
/// IDF for terms not present in the new document is left as written by its
/// own last trigger (term-scoped lazy recomputation); the read path computes
/// from the live counts, so responses stay fresh regardless.
pub fn apply_new_document(
    scope_id: &ScopeId,
    state: &mut ScopeState,
    doc_id: &DocId,
    tf_table: &HashMap<Term, TermFrequency>,
    mode: IdfMode,
) -> Result<()> {
    if state.contains(doc_id) {
        // Idempotent: the document is already indexed in this scope.
        return Ok(());
    }

    validate(scope_id, state, doc_id, tf_table)?;

    state.members.insert(doc_id.clone());
    let num_docs = state.document_count();

    for (term, entry) in tf_table {
        let df = state.df.entry(term.clone()).or_insert(0);
        *df += 1;
        let df = *df;

        // Post-increment N and DF: the new document counts on both sides.
        let idf = mode.idf(num_docs, df);

        let postings = state.postings.entry(term.clone()).or_default();
        // Validation already rejected an existing posting for this doc_id.
        let pos = match postings.binary_search_by(|p| p.doc_id.as_str().cmp(doc_id.as_str())) {
            Ok(pos) | Err(pos) => pos,
        };
        postings.insert(
            pos,
            Posting {
                doc_id: doc_id.clone(),
                tf: entry.tf,
                idf,
                tfidf: 0.0,
            },
        );

        // Fan out to every document containing this term. Only postings of
        // the affected terms are touched, but all of them must be: a stale
        // TF-IDF on an old document is a correctness bug.
        for posting in postings.iter_mut() {
            posting.idf = idf;
            posting.tfidf = posting.tf * idf;
        }
    }

    state.version += 1;
    tracing::debug!(
        scope = %scope_id,
        doc = %doc_id,
        terms = tf_table.len(),
        num_docs,
        version = state.version,
        "indexed document"
    );
    Ok(())
}

/// Reject the update if the scope's counters no longer agree with its
/// posting lists. Clamping would hide corruption; the indexation aborts
/// whole instead.
fn validate(
    scope_id: &ScopeId,
    state: &ScopeState,
    doc_id: &DocId,
    tf_table: &HashMap<Term, TermFrequency>,
) -> Result<()> {
    let num_docs = state.document_count();
    for term in tf_table.keys() {
        let df = state.df.get(term).copied().unwrap_or(0);
        let postings_len = state.postings.get(term).map(|p| p.len()).unwrap_or(0) as u32;
        if df != postings_len {
            return Err(EngineError::InconsistentState {
                scope: scope_id.clone(),
                detail: format!(
                    "term {term:?}: df={df} but {postings_len} postings recorded"
                ),
            });
        }
        if df > num_docs {
            return Err(EngineError::InconsistentState {
                scope: scope_id.clone(),
                detail: format!(
                    "term {term:?}: df={df} exceeds document count {num_docs}"
                ),
            });
        }
        if state
            .postings
            .get(term)
            .map(|ps| ps.iter().any(|p| p.doc_id == *doc_id))
            .unwrap_or(false)
        {
            return Err(EngineError::InconsistentState {
                scope: scope_id.clone(),
                detail: format!(
                    "term {term:?} already has a posting for non-member document {doc_id}"
                ),
            });
        }
    }
    Ok(())
}

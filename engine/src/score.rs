use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::index::{DocumentRecord, ScopeState};
use crate::{DocId, IdfMode, ScopeId, Term};

/// Default truncation for ranked term lists.
pub const DEFAULT_LIMIT: usize = 50;

/// One entry of a ranked term list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermScore {
    pub term: Term,
    pub frequency: u32,
    pub tf: f64,
    pub idf: f64,
    pub tfidf: f64,
}

impl TermScore {
    /// Presentation copy with tf/idf/tfidf rounded to 4 decimal digits.
    /// Internal storage keeps full precision.
    pub fn rounded(&self) -> TermScore {
        TermScore {
            term: self.term.clone(),
            frequency: self.frequency,
            tf: round4(self.tf),
            idf: round4(self.idf),
            tfidf: round4(self.tfidf),
        }
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Single-document mode: the document's stored TF against the scope's IDF
/// computed fresh from the live N and DF. Unlike the write path, reads must
/// reflect the current document count, so nothing cached is consulted here.
pub fn rank_document(
    scope_id: &ScopeId,
    scope: &ScopeState,
    doc: &DocumentRecord,
    mode: IdfMode,
    limit: usize,
) -> Result<Vec<TermScore>> {
    let num_docs = scope.document_count();
    let mut scores = Vec::with_capacity(doc.terms.len());
    for (term, entry) in &doc.terms {
        let df = lookup_df(scope_id, scope, term, num_docs)?;
        let idf = mode.idf(num_docs, df);
        scores.push(TermScore {
            term: term.clone(),
            frequency: entry.frequency,
            tf: entry.tf,
            idf,
            tfidf: entry.tf * idf,
        });
    }
    Ok(rank(scores, limit))
}

/// Scope-aggregate mode: all member documents merged as one concatenated
/// document. Raw frequencies are summed per term (never TF scores), the
/// combined TF divides by the grand total, and IDF stays document-level
/// from the same per-scope DF map as single-document mode. This is not the
/// sum of per-document TF-IDF values, and deliberately so.
pub fn rank_scope(
    scope_id: &ScopeId,
    scope: &ScopeState,
    documents: &HashMap<DocId, DocumentRecord>,
    mode: IdfMode,
    limit: usize,
) -> Result<Vec<TermScore>> {
    let mut merged: HashMap<&str, u64> = HashMap::new();
    for doc_id in &scope.members {
        let doc = documents
            .get(doc_id)
            .ok_or_else(|| EngineError::InconsistentState {
                scope: scope_id.clone(),
                detail: format!("member document {doc_id} has no record"),
            })?;
        for (term, entry) in &doc.terms {
            *merged.entry(term.as_str()).or_insert(0) += entry.frequency as u64;
        }
    }

    let total: u64 = merged.values().sum();
    if total == 0 {
        return Ok(Vec::new());
    }

    let num_docs = scope.document_count();
    let mut scores = Vec::with_capacity(merged.len());
    for (term, frequency) in merged {
        let df = lookup_df(scope_id, scope, term, num_docs)?;
        let idf = mode.idf(num_docs, df);
        let tf = frequency as f64 / total as f64;
        scores.push(TermScore {
            term: term.to_string(),
            frequency: frequency as u32,
            tf,
            idf,
            tfidf: tf * idf,
        });
    }
    Ok(rank(scores, limit))
}

/// DF for a term that some member document is known to contain. A missing or
/// out-of-range counter means the index drifted; surface it, never clamp.
fn lookup_df(scope_id: &ScopeId, scope: &ScopeState, term: &str, num_docs: u32) -> Result<u32> {
    match scope.df.get(term).copied() {
        Some(df) if df >= 1 && df <= num_docs => Ok(df),
        Some(df) => Err(EngineError::InconsistentState {
            scope: scope_id.clone(),
            detail: format!("term {term:?}: df={df} out of range for {num_docs} documents"),
        }),
        None => Err(EngineError::InconsistentState {
            scope: scope_id.clone(),
            detail: format!("term {term:?} present in a member document but has no df entry"),
        }),
    }
}

/// Descending tfidf; ties broken by lexicographic term order so rankings
/// are deterministic. Truncates to `limit`.
fn rank(mut scores: Vec<TermScore>, limit: usize) -> Vec<TermScore> {
    scores.sort_by(|a, b| {
        b.tfidf
            .partial_cmp(&a.tfidf)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.term.cmp(&b.term))
    });
    scores.truncate(limit);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(term: &str, tfidf: f64) -> TermScore {
        TermScore { term: term.into(), frequency: 1, tf: 0.0, idf: 0.0, tfidf }
    }

    #[test]
    fn ranks_descending_with_lexicographic_ties() {
        let ranked = rank(
            vec![score("b", 0.5), score("a", 0.5), score("c", 0.9)],
            10,
        );
        let terms: Vec<&str> = ranked.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(terms, vec!["c", "a", "b"]);
    }

    #[test]
    fn truncates_to_limit() {
        let ranked = rank((0..10).map(|i| score(&format!("t{i}"), i as f64)).collect(), 3);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn rounding_is_presentation_only() {
        let s = TermScore { term: "x".into(), frequency: 3, tf: 1.0 / 3.0, idf: 2.0f64.ln(), tfidf: 0.231_049_06 };
        let r = s.rounded();
        assert_eq!(r.tf, 0.3333);
        assert_eq!(r.idf, 0.6931);
        assert_eq!(r.tfidf, 0.2310);
        assert!((s.tf - 1.0 / 3.0).abs() < 1e-15);
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::Term;

/// Per-document statistics for one term. Owned by exactly one document;
/// computed once at creation and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermFrequency {
    /// Occurrences of the term in the document.
    pub frequency: u32,
    /// Relative frequency: occurrences / total tokens in the document.
    pub tf: f64,
}

/// Build the term frequency table for one document's token sequence.
/// Pure; an empty token sequence produces an empty table.
pub fn build_tf(tokens: &[String]) -> HashMap<Term, TermFrequency> {
    let mut counts: HashMap<Term, u32> = HashMap::new();
    for tok in tokens {
        *counts.entry(tok.clone()).or_insert(0) += 1;
    }
    let total = tokens.len() as f64;
    counts
        .into_iter()
        .map(|(term, frequency)| {
            let tf = frequency as f64 / total;
            (term, TermFrequency { frequency, tf })
        })
        .collect()
}

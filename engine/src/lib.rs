pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod score;
pub mod tf;
pub mod tokenizer;
mod updater;

use serde::{Deserialize, Serialize};

/// Opaque document identity, assigned by the caller (upload path or CLI).
pub type DocId = String;
/// Identity of a corpus or collection.
pub type ScopeId = String;
/// Normalized lowercase token; shared key across all per-scope structures.
pub type Term = String;

/// How documents relate to a scope.
///
/// A document is created into exactly one `Corpus`; `Collection` membership
/// is many-to-many and added after creation. DF/IDF for a scope only ever
/// count that scope's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Corpus,
    Collection,
}

/// IDF formula, fixed per engine instance and applied uniformly. Mixing
/// formulas within one scope's data would make stored values incomparable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdfMode {
    /// `ln(N / DF)`. Terms present in every document score exactly 0.
    #[default]
    Standard,
    /// `ln((N + 1) / (DF + 1)) + 1`. Never reaches 0.
    Smoothed,
}

impl IdfMode {
    /// Compute IDF from the live document count and document frequency.
    pub fn idf(self, num_docs: u32, df: u32) -> f64 {
        match self {
            IdfMode::Standard => (num_docs as f64 / df as f64).ln(),
            IdfMode::Smoothed => ((num_docs as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0,
        }
    }
}

pub use crate::engine::Engine;
pub use crate::error::EngineError;
pub use crate::index::{DocumentRecord, Posting, ScopeState};
pub use crate::score::TermScore;
pub use crate::tf::{build_tf, TermFrequency};
pub use crate::tokenizer::tokenize;

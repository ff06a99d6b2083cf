use thiserror::Error;

use crate::{DocId, ScopeId};

/// Failures surfaced by the engine. Empty input is never an error: an empty
/// document still registers and simply carries no terms.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("scope not found: {0}")]
    ScopeNotFound(ScopeId),

    #[error("document not found: {0}")]
    DocumentNotFound(DocId),

    #[error("document {doc} is not a member of scope {scope}")]
    DocumentNotInScope { doc: DocId, scope: ScopeId },

    #[error("scope {0} is a {1:?} scope, operation requires the other kind")]
    WrongScopeKind(ScopeId, crate::ScopeKind),

    /// Count mismatch detected during recomputation. Fatal for the update;
    /// the whole indexation aborts rather than clamping the counters.
    #[error("inconsistent index state in scope {scope}: {detail}")]
    InconsistentState { scope: ScopeId, detail: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

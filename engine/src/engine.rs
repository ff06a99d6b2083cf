use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::index::{DocumentRecord, ScopeState};
use crate::score::{rank_document, rank_scope, TermScore};
use crate::updater::apply_new_document;
use crate::{build_tf, tokenize, DocId, IdfMode, ScopeId, ScopeKind};

/// The TF-IDF engine: scope registry, document records, and the incremental
/// index, shared across request handlers.
///
/// Locking: each scope's state sits behind its own `RwLock`, so indexations
/// into different scopes proceed concurrently while writers to one scope are
/// serialized across the whole DF-update + fan-out sequence. Lock order is
/// always scope state first, then the documents map; the one place that
/// needs a document before knowing the scope takes a transient documents
/// read lock and releases it before touching any scope.
pub struct Engine {
    mode: IdfMode,
    scopes: RwLock<HashMap<ScopeId, Arc<RwLock<ScopeState>>>>,
    documents: RwLock<HashMap<DocId, DocumentRecord>>,
}

impl Engine {
    pub fn new(mode: IdfMode) -> Self {
        Self {
            mode,
            scopes: RwLock::new(HashMap::new()),
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn idf_mode(&self) -> IdfMode {
        self.mode
    }

    /// Create a scope. Returns false if a scope with this id already exists
    /// (the existing scope is left untouched).
    pub fn create_scope(&self, scope_id: &str, kind: ScopeKind) -> bool {
        let mut scopes = self.scopes.write();
        if scopes.contains_key(scope_id) {
            return false;
        }
        scopes.insert(
            scope_id.to_string(),
            Arc::new(RwLock::new(ScopeState::new(kind))),
        );
        tracing::info!(scope = scope_id, ?kind, "created scope");
        true
    }

    fn scope_handle(&self, scope_id: &str) -> Result<Arc<RwLock<ScopeState>>> {
        self.scopes
            .read()
            .get(scope_id)
            .cloned()
            .ok_or_else(|| EngineError::ScopeNotFound(scope_id.to_string()))
    }

    /// Tokenize, build the TF table, and run the incremental indexation into
    /// the owning corpus. Returns the number of distinct terms indexed.
    ///
    /// Idempotent on document id: a second call with an id the engine
    /// already knows is a no-op (content-level dedup happens upstream of
    /// this call). Empty text still registers the document.
    pub fn index_document(&self, scope_id: &ScopeId, doc_id: &DocId, text: &str) -> Result<usize> {
        let handle = self.scope_handle(scope_id)?;
        let table = build_tf(&tokenize(text));

        let mut state = handle.write();
        if state.kind != ScopeKind::Corpus {
            return Err(EngineError::WrongScopeKind(scope_id.clone(), state.kind));
        }
        {
            let documents = self.documents.read();
            if let Some(existing) = documents.get(doc_id) {
                return Ok(existing.terms.len());
            }
        }

        apply_new_document(scope_id, &mut state, doc_id, &table, self.mode)?;
        let terms = table.len();
        self.documents
            .write()
            .insert(doc_id.clone(), DocumentRecord::new(scope_id.clone(), table));
        tracing::info!(scope = %scope_id, doc = %doc_id, terms, "document indexed");
        Ok(terms)
    }

    /// Add an existing document to a collection scope and index its stored
    /// TF table there. Idempotent on repeat membership.
    pub fn add_to_collection(&self, collection_id: &ScopeId, doc_id: &DocId) -> Result<()> {
        let handle = self.scope_handle(collection_id)?;
        let mut state = handle.write();
        if state.kind != ScopeKind::Collection {
            return Err(EngineError::WrongScopeKind(collection_id.clone(), state.kind));
        }
        if state.contains(doc_id) {
            return Ok(());
        }
        let documents = self.documents.read();
        let record = documents
            .get(doc_id)
            .ok_or_else(|| EngineError::DocumentNotFound(doc_id.clone()))?;
        apply_new_document(collection_id, &mut state, doc_id, &record.terms, self.mode)
    }

    /// Ranked term statistics for one document. `scope` defaults to the
    /// document's owning corpus; the document must be a member of the scope
    /// it is scored against.
    pub fn document_scores(
        &self,
        doc_id: &DocId,
        scope: Option<&ScopeId>,
        limit: usize,
    ) -> Result<Vec<TermScore>> {
        let owning = {
            let documents = self.documents.read();
            documents
                .get(doc_id)
                .ok_or_else(|| EngineError::DocumentNotFound(doc_id.clone()))?
                .corpus
                .clone()
        };
        let scope_id = scope.unwrap_or(&owning);
        let handle = self.scope_handle(scope_id)?;
        let state = handle.read();
        if !state.contains(doc_id) {
            return Err(EngineError::DocumentNotInScope {
                doc: doc_id.clone(),
                scope: scope_id.clone(),
            });
        }
        let documents = self.documents.read();
        let record = documents
            .get(doc_id)
            .ok_or_else(|| EngineError::DocumentNotFound(doc_id.clone()))?;
        rank_document(scope_id, &state, record, self.mode, limit)
    }

    /// Ranked term statistics for a whole scope merged as one document.
    pub fn scope_scores(&self, scope_id: &ScopeId, limit: usize) -> Result<Vec<TermScore>> {
        let handle = self.scope_handle(scope_id)?;
        let state = handle.read();
        let documents = self.documents.read();
        rank_scope(scope_id, &state, &documents, self.mode, limit)
    }

    pub fn document_count(&self, scope_id: &ScopeId) -> Result<u32> {
        Ok(self.scope_handle(scope_id)?.read().document_count())
    }

    pub fn members(&self, scope_id: &ScopeId) -> Result<Vec<DocId>> {
        Ok(self
            .scope_handle(scope_id)?
            .read()
            .members
            .iter()
            .cloned()
            .collect())
    }

    pub fn contains_document(&self, scope_id: &ScopeId, doc_id: &DocId) -> Result<bool> {
        Ok(self.scope_handle(scope_id)?.read().contains(doc_id))
    }

    /// Owning corpus of a document, if the engine knows it.
    pub fn owning_corpus(&self, doc_id: &DocId) -> Option<ScopeId> {
        self.documents.read().get(doc_id).map(|r| r.corpus.clone())
    }

    /// Clone out the full state for snapshot persistence.
    pub fn export(&self) -> (HashMap<ScopeId, ScopeState>, HashMap<DocId, DocumentRecord>) {
        let scopes = self
            .scopes
            .read()
            .iter()
            .map(|(id, handle)| (id.clone(), handle.read().clone()))
            .collect();
        let documents = self.documents.read().clone();
        (scopes, documents)
    }

    /// Rebuild an engine from snapshotted state.
    pub fn from_parts(
        mode: IdfMode,
        scopes: HashMap<ScopeId, ScopeState>,
        documents: HashMap<DocId, DocumentRecord>,
    ) -> Self {
        let scopes = scopes
            .into_iter()
            .map(|(id, state)| (id, Arc::new(RwLock::new(state))))
            .collect();
        Self {
            mode,
            scopes: RwLock::new(scopes),
            documents: RwLock::new(documents),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(IdfMode::Standard)
    }
}

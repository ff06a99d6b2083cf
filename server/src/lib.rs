use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use engine::persist::{save_snapshot, IndexPaths};
use engine::score::DEFAULT_LIMIT;
use engine::{Engine, EngineError, ScopeKind};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub index_dir: PathBuf,
    pub admin_token: Option<String>,
    /// Content hash -> document id, the upstream dedup check: an upload
    /// whose hash is already known never reaches the indexer again.
    pub content_hashes: Arc<RwLock<HashMap<String, String>>>,
}

pub fn build_app(engine: Arc<Engine>, index_dir: PathBuf) -> Router {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState {
        engine,
        index_dir,
        admin_token,
        content_hashes: Arc::new(RwLock::new(HashMap::new())),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/scopes", post(create_scope))
        .route("/scopes/:scope_id/documents", post(upload_document))
        .route("/scopes/:scope_id/members/:doc_id", post(add_member))
        .route("/scopes/:scope_id/statistics", get(scope_statistics))
        .route("/documents/:doc_id/tfidf", get(document_tfidf))
        .route("/admin/save", post(save_index))
        .with_state(state)
        .layer(cors)
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(err: EngineError) -> ApiError {
    let status = match &err {
        EngineError::ScopeNotFound(_)
        | EngineError::DocumentNotFound(_)
        | EngineError::DocumentNotInScope { .. } => StatusCode::NOT_FOUND,
        EngineError::WrongScopeKind(..) => StatusCode::CONFLICT,
        EngineError::InconsistentState { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "index state error");
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

#[derive(Deserialize)]
pub struct CreateScopeRequest {
    pub id: String,
    pub kind: ScopeKind,
}

async fn create_scope(
    State(state): State<AppState>,
    Json(req): Json<CreateScopeRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let created = state.engine.create_scope(&req.id, req.kind);
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    (status, Json(serde_json::json!({ "id": req.id, "created": created })))
}

#[derive(Deserialize)]
pub struct UploadRequest {
    pub id: Option<String>,
    pub text: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub terms_indexed: usize,
    pub deduplicated: bool,
}

async fn upload_document(
    State(state): State<AppState>,
    Path(scope_id): Path<String>,
    Json(req): Json<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let hash = content_hash(&scope_id, &req.text);

    if let Some(existing) = state.content_hashes.read().get(&hash) {
        tracing::info!(scope = %scope_id, doc = %existing, "duplicate upload");
        return Ok((
            StatusCode::OK,
            Json(UploadResponse {
                document_id: existing.clone(),
                terms_indexed: 0,
                deduplicated: true,
            }),
        ));
    }

    let doc_id = req.id.unwrap_or_else(|| hash.clone());
    let terms_indexed = state
        .engine
        .index_document(&scope_id, &doc_id, &req.text)
        .map_err(api_error)?;
    state.content_hashes.write().insert(hash, doc_id.clone());

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse { document_id: doc_id, terms_indexed, deduplicated: false }),
    ))
}

async fn add_member(
    State(state): State<AppState>,
    Path((scope_id, doc_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .engine
        .add_to_collection(&scope_id, &doc_id)
        .map_err(api_error)?;
    let count = state.engine.document_count(&scope_id).map_err(api_error)?;
    Ok(Json(serde_json::json!({
        "scope_id": scope_id,
        "document_id": doc_id,
        "document_count": count,
    })))
}

#[derive(Deserialize)]
pub struct ScoreParams {
    pub scope_id: Option<String>,
    pub limit: Option<usize>,
}

async fn document_tfidf(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    Query(params): Query<ScoreParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let scores = state
        .engine
        .document_scores(&doc_id, params.scope_id.as_ref(), limit)
        .map_err(api_error)?;
    let terms: Vec<_> = scores.iter().map(|s| s.rounded()).collect();
    Ok(Json(serde_json::json!({ "document_id": doc_id, "terms": terms })))
}

async fn scope_statistics(
    State(state): State<AppState>,
    Path(scope_id): Path<String>,
    Query(params): Query<ScoreParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let scores = state.engine.scope_scores(&scope_id, limit).map_err(api_error)?;
    let count = state.engine.document_count(&scope_id).map_err(api_error)?;
    let terms: Vec<_> = scores.iter().map(|s| s.rounded()).collect();
    Ok(Json(serde_json::json!({
        "scope_id": scope_id,
        "document_count": count,
        "terms": terms,
    })))
}

async fn save_index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    let paths = IndexPaths::new(&state.index_dir);
    save_snapshot(&paths, state.engine.as_ref(), created_at)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    tracing::info!(dir = %state.index_dir.display(), "snapshot saved");
    Ok(Json(serde_json::json!({ "saved": true })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers
        .get("X-ADMIN-TOKEN")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

fn content_hash(scope_id: &str, text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(scope_id.as_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

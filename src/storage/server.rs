//! HTTP shim over the block store
//!
//! `POST /add` stores product metadata and answers with its CID, `GET /:cid`
//! returns the stored JSON. Every failure is reported as
//! `400 {"message": ...}`.

use super::blockstore::BlockStore;
use super::content_id::{json_cid, parse_cid, verify_block};
use super::ProductMetadata;
use crate::error::HarnessError;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct StorageState {
    store: Arc<dyn BlockStore>,
}

#[derive(Debug)]
pub struct StorageApiError(String);

impl IntoResponse for StorageApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { message: self.0 }),
        )
            .into_response()
    }
}

impl From<HarnessError> for StorageApiError {
    fn from(err: HarnessError) -> Self {
        StorageApiError(err.to_string())
    }
}

impl From<JsonRejection> for StorageApiError {
    fn from(rejection: JsonRejection) -> Self {
        StorageApiError(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Serialize)]
pub struct AddResponse {
    pub cid: String,
}

/// Block stores are synchronous (SQLite in particular), so every store call
/// runs on the blocking pool instead of an async worker.
async fn blocking<T, F>(task: F) -> Result<T, StorageApiError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StorageApiError(format!("storage task failed: {}", e)))?
        .map_err(StorageApiError::from)
}

async fn add_content(
    State(state): State<StorageState>,
    payload: Result<Json<ProductMetadata>, JsonRejection>,
) -> Result<Json<AddResponse>, StorageApiError> {
    let Json(metadata) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "rejected /add body");
        StorageApiError::from(rejection)
    })?;

    let bytes = serde_json::to_vec(&metadata).map_err(HarnessError::from)?;
    let cid = json_cid(&bytes)?;
    let size = bytes.len();
    let store = state.store.clone();
    blocking(move || {
        store.put(&cid, &bytes)?;
        store.pin(&cid)
    })
    .await?;

    tracing::info!(cid = %cid, name = %metadata.name, bytes = size, "stored product metadata");
    Ok(Json(AddResponse {
        cid: cid.to_string(),
    }))
}

async fn get_content(
    State(state): State<StorageState>,
    Path(cid_str): Path<String>,
) -> Result<Response, StorageApiError> {
    tracing::info!(cid = %cid_str, "lookup");
    let cid = parse_cid(&cid_str)?;
    let store = state.store.clone();
    let bytes = blocking(move || store.get(&cid))
        .await?
        .ok_or_else(|| HarnessError::StorageError(format!("block {} not found", cid)))?;
    verify_block(&cid, &bytes)?;

    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "storage.request"
    );

    response
}

/// Build the storage router (also used directly by tests).
pub fn build_storage_router(store: Arc<dyn BlockStore>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/add", post(add_content))
        .route("/:cid", get(get_content))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(StorageState { store })
}

pub async fn run_storage_server(
    store: Arc<dyn BlockStore>,
    port: u16,
    max_body_bytes: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_storage_router(store, max_body_bytes);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("storage backend is listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

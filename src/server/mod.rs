//! In-memory REST collection backend.
//!
//! Serves the protocol the editor speaks, backed by [`MemoryCollection`]s:
//! - `GET /:endpoint`
//! - `POST /:endpoint`
//! - `GET /:endpoint/:id`
//! - `PUT /:endpoint/:id`
//! - `DELETE /:endpoint/:id`
//!
//! Only endpoints registered up front are served; anything else is a 404.

pub mod error;

use crate::core::EntityRecord;
use crate::store::MemoryCollection;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use error::Result;
use log::{debug, info};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ErrorResponse, ServerError};

#[derive(Clone, Default)]
struct CollectionServerState {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
}

/// Builder and runner for the in-memory backend.
#[derive(Clone, Default)]
pub struct CollectionServer {
    state: CollectionServerState,
}

impl CollectionServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an endpoint with seed records.
    pub async fn with_collection(self, endpoint: &str, records: Vec<EntityRecord>) -> Self {
        self.state.collections.write().await.insert(
            endpoint.trim_matches('/').to_string(),
            MemoryCollection::with_records(records),
        );
        self
    }

    /// Current records of an endpoint, if registered.
    pub async fn records(&self, endpoint: &str) -> Option<Vec<EntityRecord>> {
        self.state
            .collections
            .read()
            .await
            .get(endpoint)
            .map(|c| c.list().to_vec())
    }

    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .route("/:endpoint", axum::routing::get(list).post(create))
            .route(
                "/:endpoint/:id",
                axum::routing::get(fetch).put(update).delete(remove),
            )
            .with_state(self.state.clone())
    }

    /// Serves until the listener fails.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!("collection server listening on http://{}", addr);
        }
        let app = self
            .router()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());
        axum::serve(listener, app).await
    }
}

fn unknown_endpoint(endpoint: &str) -> ServerError {
    ServerError::NotFound(format!("unknown endpoint '{}'", endpoint))
}

fn missing_record(endpoint: &str, id: i64) -> ServerError {
    ServerError::NotFound(format!("record {} not found in '{}'", id, endpoint))
}

fn ensure_object(payload: &JsonValue) -> Result<()> {
    if payload.is_object() {
        Ok(())
    } else {
        Err(ServerError::Input(
            "request body must be a JSON object".to_string(),
        ))
    }
}

async fn list(
    State(state): State<CollectionServerState>,
    Path(endpoint): Path<String>,
) -> Result<Json<JsonValue>> {
    let collections = state.collections.read().await;
    let collection = collections
        .get(&endpoint)
        .ok_or_else(|| unknown_endpoint(&endpoint))?;
    let docs = collection
        .list()
        .iter()
        .map(EntityRecord::to_json)
        .collect::<Vec<_>>();
    Ok(Json(JsonValue::Array(docs)))
}

async fn fetch(
    State(state): State<CollectionServerState>,
    Path((endpoint, id)): Path<(String, i64)>,
) -> Result<Json<JsonValue>> {
    let collections = state.collections.read().await;
    let collection = collections
        .get(&endpoint)
        .ok_or_else(|| unknown_endpoint(&endpoint))?;
    let record = collection
        .get(id)
        .ok_or_else(|| missing_record(&endpoint, id))?;
    Ok(Json(record.to_json()))
}

async fn create(
    State(state): State<CollectionServerState>,
    Path(endpoint): Path<String>,
    Json(payload): Json<JsonValue>,
) -> Result<axum::response::Response> {
    ensure_object(&payload)?;
    let mut collections = state.collections.write().await;
    let collection = collections
        .get_mut(&endpoint)
        .ok_or_else(|| unknown_endpoint(&endpoint))?;
    let record = collection.create(&payload)?;
    debug!("created {}/{}", endpoint, record.id);
    Ok((StatusCode::CREATED, Json(record.to_json())).into_response())
}

async fn update(
    State(state): State<CollectionServerState>,
    Path((endpoint, id)): Path<(String, i64)>,
    Json(payload): Json<JsonValue>,
) -> Result<Json<JsonValue>> {
    ensure_object(&payload)?;
    let mut collections = state.collections.write().await;
    let collection = collections
        .get_mut(&endpoint)
        .ok_or_else(|| unknown_endpoint(&endpoint))?;
    let record = collection
        .update(id, &payload)?
        .ok_or_else(|| missing_record(&endpoint, id))?;
    debug!("updated {}/{}", endpoint, id);
    Ok(Json(record.to_json()))
}

async fn remove(
    State(state): State<CollectionServerState>,
    Path((endpoint, id)): Path<(String, i64)>,
) -> Result<StatusCode> {
    let mut collections = state.collections.write().await;
    let collection = collections
        .get_mut(&endpoint)
        .ok_or_else(|| unknown_endpoint(&endpoint))?;
    if !collection.delete(id) {
        return Err(missing_record(&endpoint, id));
    }
    debug!("deleted {}/{}", endpoint, id);
    Ok(StatusCode::NO_CONTENT)
}

//! In-process collection backend.
//!
//! [`MemoryCollection`] holds the records and id allocation shared by the
//! demo server and [`MemoryTransport`]; the transport adds a call log and
//! scripted failures so callers can observe exactly which requests a table
//! issued.

use super::transport::{CollectionTransport, TransportResponse};
use crate::core::{EntityRecord, GridError, Result};
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Records of one collection with server-side id assignment.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    records: Vec<EntityRecord>,
    next_id: i64,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    pub fn with_records(records: Vec<EntityRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0).max(0) + 1;
        Self { records, next_id }
    }

    pub fn list(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn get(&self, id: i64) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts a record from a flat JSON body; any client-sent id is ignored.
    pub fn create(&mut self, body: &JsonValue) -> Result<EntityRecord> {
        let mut record = EntityRecord::from_json(body)?;
        record.id = self.next_id;
        self.next_id += 1;
        self.records.push(record.clone());
        Ok(record)
    }

    /// Merges a flat JSON body into the record; `None` when the id is unknown.
    pub fn update(&mut self, id: i64, body: &JsonValue) -> Result<Option<EntityRecord>> {
        let partial = EntityRecord::from_json(body)?;
        let Some(existing) = self.records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        existing.merge(&partial);
        Ok(Some(existing.clone()))
    }

    pub fn delete(&mut self, id: i64) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// One request as seen by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    List,
    Create(JsonValue),
    Update(i64, JsonValue),
    Delete(i64),
}

impl TransportCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::List)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    collection: MemoryCollection,
    calls: Vec<TransportCall>,
    writes_seen: usize,
    write_failures: BTreeMap<usize, String>,
    list_failure: Option<String>,
}

/// Transport answering from an in-process [`MemoryCollection`].
///
/// Clones share state, so a caller can keep a handle for inspection after
/// handing one to a store.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    endpoint: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    pub fn new(endpoint: &str) -> Self {
        Self::with_records(endpoint, Vec::new())
    }

    pub fn with_records(endpoint: &str, records: Vec<EntityRecord>) -> Self {
        let state = MemoryState {
            collection: MemoryCollection::with_records(records),
            ..MemoryState::default()
        };
        Self {
            endpoint: endpoint.trim_matches('/').to_string(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| GridError::Transport(format!("memory backend poisoned: {}", e)))
    }

    /// Every request issued so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Requests other than `list`.
    pub fn write_calls(&self) -> Vec<TransportCall> {
        self.calls().into_iter().filter(TransportCall::is_write).collect()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.lock() {
            state.calls.clear();
        }
    }

    /// Backend-side records.
    pub fn records(&self) -> Vec<EntityRecord> {
        self.lock()
            .map(|s| s.collection.list().to_vec())
            .unwrap_or_default()
    }

    /// Makes the `n`-th write from now (0 = next) fail as a transport error.
    pub fn fail_nth_write(&self, n: usize, message: &str) {
        if let Ok(mut state) = self.lock() {
            let at = state.writes_seen + n;
            state.write_failures.insert(at, message.to_string());
        }
    }

    /// Makes every `list` fail until cleared with `None`.
    pub fn set_list_failure(&self, message: Option<&str>) {
        if let Ok(mut state) = self.lock() {
            state.list_failure = message.map(str::to_string);
        }
    }

    fn begin_write(&self, call: TransportCall) -> Result<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock()?;
        state.calls.push(call);
        let index = state.writes_seen;
        state.writes_seen += 1;
        if let Some(message) = state.write_failures.remove(&index) {
            return Err(GridError::Transport(message));
        }
        Ok(state)
    }
}

#[async_trait]
impl CollectionTransport for MemoryTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list(&self) -> Result<TransportResponse> {
        let mut state = self.lock()?;
        state.calls.push(TransportCall::List);
        if let Some(message) = &state.list_failure {
            return Err(GridError::Transport(message.clone()));
        }
        let body = state
            .collection
            .list()
            .iter()
            .map(EntityRecord::to_json)
            .collect::<Vec<_>>();
        Ok(TransportResponse::new(200, JsonValue::Array(body)))
    }

    async fn create(&self, body: JsonValue) -> Result<TransportResponse> {
        let mut state = self.begin_write(TransportCall::Create(body.clone()))?;
        match state.collection.create(&body) {
            Ok(record) => Ok(TransportResponse::new(201, record.to_json())),
            Err(err) => Ok(unprocessable(err)),
        }
    }

    async fn update(&self, id: i64, body: JsonValue) -> Result<TransportResponse> {
        let mut state = self.begin_write(TransportCall::Update(id, body.clone()))?;
        match state.collection.update(id, &body) {
            Ok(Some(record)) => Ok(TransportResponse::new(200, record.to_json())),
            Ok(None) => Ok(not_found(id)),
            Err(err) => Ok(unprocessable(err)),
        }
    }

    async fn delete(&self, id: i64) -> Result<TransportResponse> {
        let mut state = self.begin_write(TransportCall::Delete(id))?;
        if state.collection.delete(id) {
            Ok(TransportResponse::new(204, JsonValue::Null))
        } else {
            Ok(not_found(id))
        }
    }
}

fn not_found(id: i64) -> TransportResponse {
    TransportResponse::new(
        404,
        json!({"error": format!("record {} not found", id), "code": "not_found"}),
    )
}

fn unprocessable(err: GridError) -> TransportResponse {
    TransportResponse::new(
        422,
        json!({"error": err.to_string(), "code": "input_error"}),
    )
}

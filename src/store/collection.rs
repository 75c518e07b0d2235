use super::transport::{CollectionTransport, TransportResponse};
use crate::config::AckPolicy;
use crate::core::{EntityRecord, GridError, Result, SENTINEL_ID};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

/// Per-item adapter from an upstream JSON shape to the flat entity shape.
pub type LoadTransform = Arc<dyn Fn(JsonValue) -> Result<JsonValue> + Send + Sync>;

/// Client-side view of a remote collection.
///
/// Owns the snapshot: the last state of the collection the store believes the
/// backend holds. Writes mutate the snapshot once their request completes.
pub struct RemoteCollectionStore<T: CollectionTransport> {
    transport: T,
    snapshot: im::Vector<EntityRecord>,
    ack_policy: AckPolicy,
    last_placeholder: i64,
}

impl<T: CollectionTransport> RemoteCollectionStore<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            snapshot: im::Vector::new(),
            ack_policy: AckPolicy::default(),
            last_placeholder: SENTINEL_ID,
        }
    }

    pub fn with_ack_policy(mut self, policy: AckPolicy) -> Self {
        self.ack_policy = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn snapshot(&self) -> &im::Vector<EntityRecord> {
        &self.snapshot
    }

    pub fn find(&self, id: i64) -> Option<&EntityRecord> {
        self.snapshot.iter().find(|r| r.id == id)
    }

    /// Fetches the collection and replaces the snapshot.
    pub async fn load(&mut self, transform: Option<&LoadTransform>) -> Result<Vec<EntityRecord>> {
        let span = info_span!("store.load", endpoint = %self.transport.endpoint());
        let response = self.transport.list().instrument(span).await?;

        if !response.is_success() {
            return Err(GridError::Rejected {
                status: response.status,
                message: response.error_message(),
            });
        }

        let JsonValue::Array(items) = response.body else {
            return Err(GridError::Decode(format!(
                "'{}' did not return a list",
                self.transport.endpoint()
            )));
        };

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            let item = match transform {
                Some(transform) => transform(item)?,
                None => item,
            };
            records.push(EntityRecord::from_json(&item)?);
        }

        self.snapshot = records.iter().cloned().collect();
        event!(
            Level::INFO,
            endpoint = %self.transport.endpoint(),
            count = records.len(),
            "collection loaded"
        );
        Ok(records)
    }

    /// Sends a creation request and appends a locally synthesized record.
    ///
    /// The returned record carries a client-generated placeholder id; the id
    /// the server assigned is not read back.
    pub async fn create(&mut self, record: &EntityRecord) -> Result<EntityRecord> {
        let body = JsonValue::Object(record.fields_json());
        let response = self.transport.create(body).await?;
        self.acknowledge("create", &response)?;

        let mut created = record.clone();
        created.id = self.next_placeholder_id();
        self.snapshot.push_back(created.clone());
        event!(Level::DEBUG, id = created.id, "record created");
        Ok(created)
    }

    /// Sends an update and merges `partial` into the snapshot entry.
    pub async fn update(&mut self, id: i64, partial: &EntityRecord) -> Result<()> {
        let body = JsonValue::Object(partial.fields_json());
        let response = self.transport.update(id, body).await?;
        self.acknowledge("update", &response)?;

        if let Some(entry) = self.snapshot.iter_mut().find(|r| r.id == id) {
            entry.merge(partial);
        }
        event!(Level::DEBUG, id, "record updated");
        Ok(())
    }

    /// Sends a delete and drops the snapshot entry.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        let response = self.transport.delete(id).await?;
        self.acknowledge("delete", &response)?;

        self.snapshot.retain(|r| r.id != id);
        event!(Level::DEBUG, id, "record deleted");
        Ok(())
    }

    fn acknowledge(&self, op: &str, response: &TransportResponse) -> Result<()> {
        if response.is_success() {
            return Ok(());
        }
        match self.ack_policy {
            AckPolicy::Optimistic => {
                event!(
                    Level::WARN,
                    op,
                    status = response.status,
                    "write not acknowledged, applying locally anyway"
                );
                Ok(())
            }
            AckPolicy::Strict => Err(GridError::Rejected {
                status: response.status,
                message: response.error_message(),
            }),
        }
    }

    fn next_placeholder_id(&mut self) -> i64 {
        let max_known = self.snapshot.iter().map(|r| r.id).max().unwrap_or(SENTINEL_ID);
        self.last_placeholder = max_known.max(self.last_placeholder).max(SENTINEL_ID) + 1;
        self.last_placeholder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldValue;
    use crate::store::memory::{MemoryTransport, TransportCall};
    use serde_json::json;

    fn seeded() -> (MemoryTransport, RemoteCollectionStore<MemoryTransport>) {
        let transport = MemoryTransport::with_records(
            "users",
            vec![
                EntityRecord::new(1).with("name", "A"),
                EntityRecord::new(2).with("name", "B"),
            ],
        );
        (transport.clone(), RemoteCollectionStore::new(transport))
    }

    #[tokio::test]
    async fn test_load_replaces_snapshot() {
        let (_, mut store) = seeded();
        let records = store.load(None).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(store.find(2).and_then(|r| r.get("name")), Some(&FieldValue::from("B")));
    }

    #[tokio::test]
    async fn test_load_applies_transform_per_item() {
        let (_, mut store) = seeded();
        let lower: LoadTransform = Arc::new(|item: JsonValue| -> Result<JsonValue> {
            let name = item["name"].as_str().unwrap_or_default().to_lowercase();
            Ok(json!({"id": item["id"], "name": name}))
        });
        let records = store.load(Some(&lower)).await.unwrap();
        assert_eq!(records[0].get("name"), Some(&FieldValue::from("a")));
    }

    #[tokio::test]
    async fn test_load_failure_propagates() {
        let (transport, mut store) = seeded();
        transport.set_list_failure(Some("connection refused"));
        assert!(matches!(store.load(None).await, Err(GridError::Transport(_))));
    }

    #[tokio::test]
    async fn test_create_appends_placeholder_record() {
        let (transport, mut store) = seeded();
        store.load(None).await.unwrap();

        let created = store
            .create(&EntityRecord::unpersisted().with("name", "C"))
            .await
            .unwrap();
        assert_eq!(created.id, 3);
        assert_eq!(store.snapshot().len(), 3);
        assert_eq!(
            transport.write_calls(),
            vec![TransportCall::Create(json!({"name": "C"}))]
        );
    }

    #[tokio::test]
    async fn test_update_merges_into_snapshot() {
        let (_, mut store) = seeded();
        store.load(None).await.unwrap();
        store
            .update(1, &EntityRecord::new(1).with("name", "A2"))
            .await
            .unwrap();
        assert_eq!(store.find(1).and_then(|r| r.get("name")), Some(&FieldValue::from("A2")));
    }

    #[tokio::test]
    async fn test_optimistic_policy_ignores_rejections() {
        let (_, mut store) = seeded();
        store.load(None).await.unwrap();
        // id 9 is unknown to the backend (404) but the snapshot is still touched.
        store.delete(9).await.unwrap();
        store.delete(2).await.unwrap();
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_strict_policy_surfaces_rejections() {
        let (_, store) = seeded();
        let mut store = store.with_ack_policy(AckPolicy::Strict);
        store.load(None).await.unwrap();
        let err = store
            .update(9, &EntityRecord::new(9).with("name", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GridError::Rejected { status: 404, .. }));
        assert_eq!(store.snapshot().len(), 2);
    }
}

// ============================================================================
// crudgrid Library
// ============================================================================

pub mod config;
pub mod core;
pub mod schema;
pub mod server;
pub mod store;
pub mod table;

// Re-export main types for convenience
pub use crate::config::{AckPolicy, ClientConfig};
pub use crate::core::{EntityRecord, FieldValue, GridError, Result, SENTINEL_ID};
pub use schema::{EntityConfig, FieldSpec, InputKind, RuleSpec};
pub use server::CollectionServer;
pub use store::{
    CollectionTransport, HttpTransport, LoadTransform, MemoryTransport, RemoteCollectionStore,
};
pub use table::{
    ConfirmDecision, Confirmer, DeleteOutcome, EditableTable, RowState, SaveOutcome, TableAction,
    TableStatus,
};

use std::sync::Arc;

/// Mounts a table for `config` against an HTTP backend.
///
/// This is the usual way to put an editor on screen: it wires the reqwest
/// transport, the store's acknowledgement policy and the notification
/// lifetime from one [`ClientConfig`].
///
/// # Examples
///
/// ```no_run
/// use crudgrid::{ClientConfig, EntityConfig};
/// use std::sync::Arc;
///
/// # async fn run() -> crudgrid::Result<()> {
/// let entity = Arc::new(EntityConfig::users_demo()?);
/// let client = ClientConfig::new("http://localhost:3000");
/// let mut table = crudgrid::mount_http(entity, &client, None).await?;
///
/// table.append_row()?;
/// table.edit_field(0, "name", "Ada")?;
/// # Ok(())
/// # }
/// ```
pub async fn mount_http(
    config: Arc<EntityConfig>,
    client: &ClientConfig,
    transform: Option<LoadTransform>,
) -> Result<EditableTable<HttpTransport>> {
    let transport = HttpTransport::new(client, config.endpoint())?;
    let store = RemoteCollectionStore::new(transport).with_ack_policy(client.ack_policy);
    Ok(EditableTable::mount(config, store, transform)
        .await
        .with_notification_ttl(client.notification_ttl))
}

/// Mounts a table over an in-process collection seeded with `records`.
///
/// # Examples
///
/// ```
/// use crudgrid::{ClientConfig, EntityConfig, EntityRecord, SaveOutcome};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let entity = Arc::new(EntityConfig::users_demo().unwrap());
/// let seed = vec![EntityRecord::new(1).with("name", "Ada").with("email", "ada@example.com")];
/// let mut table = crudgrid::mount_memory(entity, &ClientConfig::default(), seed).await;
///
/// table.edit_field(0, "name", "Ada Lovelace").unwrap();
/// assert_eq!(
///     table.save().await.unwrap(),
///     SaveOutcome::Saved { created: 0, updated: 1 }
/// );
/// # });
/// ```
pub async fn mount_memory(
    config: Arc<EntityConfig>,
    client: &ClientConfig,
    records: Vec<EntityRecord>,
) -> EditableTable<MemoryTransport> {
    let transport = MemoryTransport::with_records(config.endpoint(), records);
    let store = RemoteCollectionStore::new(transport).with_ack_policy(client.ack_policy);
    EditableTable::mount(config, store, None)
        .await
        .with_notification_ttl(client.notification_ttl)
}

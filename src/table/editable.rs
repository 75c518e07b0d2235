use super::confirm::{ConfirmDecision, ConfirmPrompt, Confirmer};
use super::notify::{NotificationLevel, Notifications};
use super::row::{EditRow, RowKey, RowState};
use super::view::{ActionOutcome, RowView, TableAction, TableView};
use crate::core::{EntityRecord, FieldValue, GridError, Result};
use crate::schema::EntityConfig;
use crate::store::{CollectionTransport, LoadTransform, RemoteCollectionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Ready,
    /// Initial load failed; the table shows an error panel until reloaded.
    LoadFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    NothingToSave,
    Saved { created: usize, updated: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Row left the buffer; `remote` tells whether a delete request was sent.
    Removed { remote: bool },
    Cancelled,
    Expired,
}

/// Editable view over a remote collection.
///
/// Owns the edit buffer and the diff baseline. The baseline is positional:
/// entry `i` is what row `i` looked like after the last load or save, and
/// rows past its end are unpersisted appends.
pub struct EditableTable<T: CollectionTransport> {
    config: Arc<EntityConfig>,
    store: RemoteCollectionStore<T>,
    transform: Option<LoadTransform>,
    status: TableStatus,
    rows: Vec<EditRow>,
    baseline: im::Vector<EntityRecord>,
    notifications: Notifications,
}

impl<T: CollectionTransport> EditableTable<T> {
    /// Loads the collection once. A failed load leaves the table in
    /// [`TableStatus::LoadFailed`] rather than returning an error.
    pub async fn mount(
        config: Arc<EntityConfig>,
        store: RemoteCollectionStore<T>,
        transform: Option<LoadTransform>,
    ) -> Self {
        let mut table = Self {
            config,
            store,
            transform,
            status: TableStatus::Ready,
            rows: Vec::new(),
            baseline: im::Vector::new(),
            notifications: Notifications::default(),
        };
        table.load().await;
        table
    }

    pub fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.notifications.set_ttl(ttl);
        self
    }

    /// Manual retry of the initial load; discards the edit buffer.
    pub async fn reload(&mut self) -> Result<usize> {
        self.load().await;
        match &self.status {
            TableStatus::Ready => Ok(self.rows.len()),
            TableStatus::LoadFailed(message) => Err(GridError::Unavailable(message.clone())),
        }
    }

    async fn load(&mut self) {
        match self.store.load(self.transform.as_ref()).await {
            Ok(records) => {
                self.baseline = records.iter().cloned().collect();
                self.rows = records.into_iter().map(EditRow::new).collect();
                for row in &mut self.rows {
                    row.revalidate(&self.config);
                }
                self.status = TableStatus::Ready;
            }
            Err(err) => {
                event!(Level::ERROR, entity = self.config.name(), error = %err, "load failed");
                self.rows.clear();
                self.baseline = im::Vector::new();
                self.status = TableStatus::LoadFailed(err.to_string());
            }
        }
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn status(&self) -> &TableStatus {
        &self.status
    }

    pub fn store(&self) -> &RemoteCollectionStore<T> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> Vec<EntityRecord> {
        self.rows.iter().map(|r| r.record.clone()).collect()
    }

    pub fn baseline(&self) -> &im::Vector<EntityRecord> {
        &self.baseline
    }

    pub fn notifications(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    fn ensure_ready(&self) -> Result<()> {
        match &self.status {
            TableStatus::Ready => Ok(()),
            TableStatus::LoadFailed(message) => Err(GridError::Unavailable(message.clone())),
        }
    }

    fn row(&self, index: usize) -> Result<&EditRow> {
        self.rows.get(index).ok_or(GridError::RowOutOfRange(index))
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut EditRow> {
        self.rows.get_mut(index).ok_or(GridError::RowOutOfRange(index))
    }

    pub fn row_state(&self, index: usize) -> Result<RowState> {
        let row = self.row(index)?;
        Ok(self.state_of(index, &row.record))
    }

    fn state_of(&self, index: usize, record: &EntityRecord) -> RowState {
        if !record.is_persisted() {
            return RowState::Unpersisted;
        }
        match self.baseline.get(index) {
            Some(saved) if saved == record => RowState::PersistedClean,
            _ => RowState::PersistedDirty,
        }
    }

    pub fn row_key(&self, index: usize) -> Result<RowKey> {
        Ok(RowKey::for_record(index, &self.row(index)?.record))
    }

    /// Rows that `save` would submit, in buffer order.
    pub fn dirty_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(i, row)| self.state_of(*i, &row.record).is_dirty())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn view(&self) -> TableView<'_> {
        TableView {
            config: &self.config,
            status: &self.status,
            rows: self
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| RowView::new(i, self.state_of(i, &row.record), row))
                .collect(),
        }
    }

    /// Appends a copy of the entity's empty template and returns its index.
    pub fn append_row(&mut self) -> Result<usize> {
        self.ensure_ready()?;
        let mut row = EditRow::new(self.config.empty_record());
        row.revalidate(&self.config);
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    /// Applies raw input to a field and re-validates the row.
    pub fn edit_field(&mut self, index: usize, field: &str, raw: &str) -> Result<()> {
        let value = self.config.parse_input(field, raw)?;
        self.set_field(index, field, value)
    }

    pub fn set_field(&mut self, index: usize, field: &str, value: FieldValue) -> Result<()> {
        self.ensure_ready()?;
        if self.config.field(field).is_none() {
            return Err(GridError::UnknownField(
                field.to_string(),
                self.config.name().to_string(),
            ));
        }
        // Clearing a field the loaded record never had restores the absent state.
        let absent_in_baseline = self
            .baseline
            .get(index)
            .is_some_and(|saved| saved.get(field).is_none());
        let config = Arc::clone(&self.config);
        let row = self.row_mut(index)?;
        if value.is_blank() && absent_in_baseline {
            row.record.remove(field);
        } else {
            row.record.set(field, value);
        }
        row.touched.insert(field.to_string());
        row.revalidate(&config);
        Ok(())
    }

    /// First half of a delete: builds the prompt for the user.
    pub fn begin_delete(&self, index: usize) -> Result<ConfirmPrompt> {
        self.ensure_ready()?;
        let row = self.row(index)?;
        let key = RowKey::for_record(index, &row.record);
        let message = match key {
            RowKey::Id(id) => format!("Delete {} #{}?", self.config.name(), id),
            RowKey::Index(i) => format!("Discard new row {}?", i + 1),
        };
        Ok(ConfirmPrompt {
            row: index,
            key,
            message,
        })
    }

    /// Second half of a delete: applies the user's decision.
    pub async fn finish_delete(
        &mut self,
        prompt: &ConfirmPrompt,
        decision: ConfirmDecision,
    ) -> Result<DeleteOutcome> {
        match decision {
            ConfirmDecision::Cancel => return Ok(DeleteOutcome::Cancelled),
            ConfirmDecision::Expired => return Ok(DeleteOutcome::Expired),
            ConfirmDecision::Confirm => {}
        }
        self.ensure_ready()?;

        let index = prompt.row;
        let record = &self.row(index)?.record;
        if RowKey::for_record(index, record) != prompt.key {
            // The buffer moved under the prompt; refuse rather than delete a different row.
            return Err(GridError::RowOutOfRange(index));
        }

        let remote = record.is_persisted();
        if remote {
            let id = record.id;
            if let Err(err) = self.store.delete(id).await {
                self.notifications
                    .push(NotificationLevel::Error, format!("Delete failed: {}", err));
                return Err(err);
            }
        }
        if index < self.baseline.len() {
            self.baseline.remove(index);
        }
        self.rows.remove(index);
        Ok(DeleteOutcome::Removed { remote })
    }

    /// Asks `confirmer` and deletes the row on confirmation.
    pub async fn delete_row(
        &mut self,
        index: usize,
        confirmer: &dyn Confirmer,
    ) -> Result<DeleteOutcome> {
        let prompt = self.begin_delete(index)?;
        let decision = confirmer.confirm(&prompt).await;
        self.finish_delete(&prompt, decision).await
    }

    /// Persists every dirty row, one request at a time.
    ///
    /// Stops at the first failing request: rows already written stay clean,
    /// the rest stay dirty.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        self.ensure_ready()?;

        let dirty = self.dirty_rows();
        if dirty.is_empty() {
            self.notifications
                .push(NotificationLevel::Info, "Nothing to save");
            return Ok(SaveOutcome::NothingToSave);
        }

        for &index in &dirty {
            let row = &mut self.rows[index];
            row.revalidate(&self.config);
            row.reveal_errors();
        }
        if let Some(&index) = dirty.iter().find(|&&i| self.rows[i].has_errors()) {
            let err = GridError::Validation {
                row: index,
                errors: self.rows[index].ordered_errors(&self.config),
            };
            self.notifications
                .push(NotificationLevel::Error, "Fix the highlighted fields before saving");
            return Err(err);
        }

        let mut created = 0;
        let mut updated = 0;
        for index in dirty {
            let record = self.rows[index].record.clone();
            let is_new = !record.is_persisted();
            let written = if !is_new {
                self.store.update(record.id, &record).await.map(|()| record)
            } else {
                self.store.create(&record).await
            };

            let saved = match written {
                Ok(saved) => saved,
                Err(err) => {
                    event!(Level::WARN, row = index, error = %err, "save aborted");
                    self.notifications
                        .push(NotificationLevel::Error, format!("Save failed: {}", err));
                    return Err(err);
                }
            };

            if is_new {
                created += 1;
            } else {
                updated += 1;
            }
            self.rows[index].record.id = saved.id;
            if index < self.baseline.len() {
                self.baseline.set(index, saved);
            } else {
                debug_assert_eq!(index, self.baseline.len());
                self.baseline.push_back(saved);
            }
        }

        for row in &mut self.rows {
            row.touched.clear();
        }
        event!(Level::INFO, entity = self.config.name(), created, updated, "saved");
        self.notifications.push(
            NotificationLevel::Success,
            format!("Saved {} row(s)", created + updated),
        );
        Ok(SaveOutcome::Saved { created, updated })
    }

    /// Single entry point for renderers.
    pub async fn dispatch(&mut self, action: TableAction) -> Result<ActionOutcome> {
        match action {
            TableAction::AppendRow => self.append_row().map(ActionOutcome::Appended),
            TableAction::EditField { row, field, value } => self
                .edit_field(row, &field, &value)
                .map(|()| ActionOutcome::Edited),
            TableAction::RequestDelete { row } => {
                self.begin_delete(row).map(ActionOutcome::DeletePending)
            }
            TableAction::ResolveDelete { prompt, decision } => self
                .finish_delete(&prompt, decision)
                .await
                .map(ActionOutcome::Deleted),
            TableAction::Save => self.save().await.map(ActionOutcome::Saved),
            TableAction::Reload => self.reload().await.map(ActionOutcome::Reloaded),
        }
    }
}

//! Read-only projection of the table handed to renderers, and the actions
//! renderers send back through [`EditableTable::dispatch`].
//!
//! [`EditableTable::dispatch`]: super::EditableTable::dispatch

use super::confirm::{ConfirmDecision, ConfirmPrompt};
use super::editable::{DeleteOutcome, SaveOutcome, TableStatus};
use super::row::{EditRow, RowKey, RowState};
use crate::core::{EntityRecord, FieldValue};
use crate::schema::EntityConfig;

/// Everything a row renderer needs: values, state and visible errors.
#[derive(Debug, Clone)]
pub struct RowView<'a> {
    pub index: usize,
    pub key: RowKey,
    pub state: RowState,
    row: &'a EditRow,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(index: usize, state: RowState, row: &'a EditRow) -> Self {
        Self {
            index,
            key: RowKey::for_record(index, &row.record),
            state,
            row,
        }
    }

    pub fn record(&self) -> &'a EntityRecord {
        &self.row.record
    }

    pub fn value(&self, field: &str) -> Option<&'a FieldValue> {
        self.row.record.get(field)
    }

    /// Error for a field the user has interacted with.
    pub fn visible_error(&self, field: &str) -> Option<&'a str> {
        if !self.row.touched.contains(field) {
            return None;
        }
        self.row.errors.get(field).map(String::as_str)
    }

    pub fn visible_errors(&self) -> Vec<(&'a str, &'a str)> {
        self.row
            .errors
            .iter()
            .filter(|(field, _)| self.row.touched.contains(*field))
            .map(|(field, message)| (field.as_str(), message.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct TableView<'a> {
    pub config: &'a EntityConfig,
    pub status: &'a TableStatus,
    pub rows: Vec<RowView<'a>>,
}

impl TableView<'_> {
    pub fn dirty_count(&self) -> usize {
        self.rows.iter().filter(|r| r.state.is_dirty()).count()
    }
}

/// Requests a renderer can make of the table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableAction {
    AppendRow,
    EditField {
        row: usize,
        field: String,
        value: String,
    },
    RequestDelete {
        row: usize,
    },
    ResolveDelete {
        prompt: ConfirmPrompt,
        decision: ConfirmDecision,
    },
    Save,
    Reload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Appended(usize),
    Edited,
    DeletePending(ConfirmPrompt),
    Deleted(DeleteOutcome),
    Saved(SaveOutcome),
    Reloaded(usize),
}

use crate::core::{EntityRecord, SENTINEL_ID};
use crate::schema::EntityConfig;
use std::collections::{BTreeMap, BTreeSet};

/// Persistence state of one row relative to the diff baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Carries the sentinel id; never saved.
    Unpersisted,
    /// Equal to the baseline entry at the same position.
    PersistedClean,
    /// Persisted but edited since the last save.
    PersistedDirty,
}

impl RowState {
    pub fn is_dirty(&self) -> bool {
        !matches!(self, Self::PersistedClean)
    }
}

/// Rendering identity: the record id once persisted, the position before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    Id(i64),
    Index(usize),
}

impl RowKey {
    pub fn for_record(index: usize, record: &EntityRecord) -> Self {
        if record.id == SENTINEL_ID {
            Self::Index(index)
        } else {
            Self::Id(record.id)
        }
    }
}

/// One entry of the edit buffer with its form state.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRow {
    pub(crate) record: EntityRecord,
    pub(crate) touched: BTreeSet<String>,
    pub(crate) errors: BTreeMap<String, String>,
}

impl EditRow {
    pub fn new(record: EntityRecord) -> Self {
        Self {
            record,
            touched: BTreeSet::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn record(&self) -> &EntityRecord {
        &self.record
    }

    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.contains(field)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Recomputes every field error of the row.
    pub(crate) fn revalidate(&mut self, config: &EntityConfig) {
        self.errors = config.validate_record(&self.record).into_iter().collect();
    }

    /// Marks failing fields as touched so their errors become visible.
    pub(crate) fn reveal_errors(&mut self) {
        let failing: Vec<String> = self.errors.keys().cloned().collect();
        self.touched.extend(failing);
    }

    /// Error list in field declaration order.
    pub(crate) fn ordered_errors(&self, config: &EntityConfig) -> Vec<(String, String)> {
        config
            .field_names()
            .filter_map(|name| {
                self.errors
                    .get(name)
                    .map(|message| (name.to_string(), message.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_key_falls_back_to_index() {
        assert_eq!(
            RowKey::for_record(3, &EntityRecord::unpersisted()),
            RowKey::Index(3)
        );
        assert_eq!(RowKey::for_record(3, &EntityRecord::new(8)), RowKey::Id(8));
    }

    #[test]
    fn test_reveal_touches_only_failing_fields() {
        let config = EntityConfig::users_demo().unwrap();
        let mut row = EditRow::new(config.empty_record());
        row.revalidate(&config);
        row.reveal_errors();
        assert!(row.is_touched("name"));
        assert!(row.is_touched("email"));
        assert!(!row.is_touched("phone"));
    }
}

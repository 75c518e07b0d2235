use crate::core::{FieldValue, GridError, Result};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;

/// Identifier carried by records that were never persisted.
pub const SENTINEL_ID: i64 = 0;

/// JSON key holding the record identifier on the wire.
pub const ID_KEY: &str = "id";

/// A flat entity record: numeric identifier plus named scalar fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityRecord {
    pub id: i64,
    pub fields: BTreeMap<String, FieldValue>,
}

impl EntityRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Record that has not been assigned a server identifier yet.
    pub fn unpersisted() -> Self {
        Self::new(SENTINEL_ID)
    }

    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id != SENTINEL_ID
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Overwrites the fields present in `partial`, keeping everything else.
    pub fn merge(&mut self, partial: &EntityRecord) {
        for (name, value) in &partial.fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// Decodes a flat JSON object. A missing `id` means the sentinel.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            GridError::Decode("record must be a JSON object".to_string())
        })?;

        let id = match object.get(ID_KEY) {
            None | Some(JsonValue::Null) => SENTINEL_ID,
            Some(JsonValue::Number(n)) => n.as_i64().ok_or_else(|| {
                GridError::Decode(format!("record id '{}' is not an integer", n))
            })?,
            // Some upstreams hand out numeric ids as strings.
            Some(JsonValue::String(s)) => s.trim().parse::<i64>().map_err(|_| {
                GridError::Decode(format!("record id '{}' is not an integer", s))
            })?,
            Some(other) => {
                return Err(GridError::Decode(format!(
                    "record id must be a number, got {}",
                    other
                )));
            }
        };

        let mut record = Self::new(id);
        for (name, raw) in object {
            if name == ID_KEY {
                continue;
            }
            record
                .fields
                .insert(name.clone(), FieldValue::from_json(name, raw)?);
        }
        Ok(record)
    }

    /// Encodes the record as a flat JSON object including `id`.
    pub fn to_json(&self) -> JsonValue {
        let mut object = self.fields_json();
        object.insert(ID_KEY.to_string(), JsonValue::from(self.id));
        JsonValue::Object(object)
    }

    /// Encodes only the named fields, as sent in create/update bodies.
    pub fn fields_json(&self) -> JsonMap<String, JsonValue> {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_flat_record() {
        let record = EntityRecord::from_json(&json!({"id": 7, "name": "A", "age": 30})).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.get("name"), Some(&FieldValue::from("A")));
        assert_eq!(record.get("age"), Some(&FieldValue::from(30_i64)));
        assert!(record.get("id").is_none());
    }

    #[test]
    fn test_missing_id_is_sentinel() {
        let record = EntityRecord::from_json(&json!({"name": "A"})).unwrap();
        assert_eq!(record.id, SENTINEL_ID);
        assert!(!record.is_persisted());
    }

    #[test]
    fn test_string_ids_are_accepted() {
        let record = EntityRecord::from_json(&json!({"id": "12"})).unwrap();
        assert_eq!(record.id, 12);
        assert!(EntityRecord::from_json(&json!({"id": "abc"})).is_err());
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let err = EntityRecord::from_json(&json!({"id": 1, "address": {"city": "x"}})).unwrap_err();
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn test_merge_overwrites_only_partial_fields() {
        let mut record = EntityRecord::new(1).with("name", "A").with("email", "a@x.io");
        record.merge(&EntityRecord::new(1).with("name", "A2"));
        assert_eq!(record.get("name"), Some(&FieldValue::from("A2")));
        assert_eq!(record.get("email"), Some(&FieldValue::from("a@x.io")));
    }

    #[test]
    fn test_fields_json_omits_id() {
        let record = EntityRecord::new(3).with("name", "C");
        let body = record.fields_json();
        assert!(!body.contains_key("id"));
        assert_eq!(record.to_json(), json!({"id": 3, "name": "C"}));
    }
}

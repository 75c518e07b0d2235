use super::field::{FieldSpec, InputKind};
use super::rules::{RuleChain, RuleSpec};
use crate::core::{EntityRecord, FieldValue, GridError, ID_KEY, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Immutable description of one editable entity.
///
/// Built once at startup (builder or JSON document) and shared read-only
/// behind an `Arc` by the store, the table and the renderers.
#[derive(Debug, Clone, Serialize)]
pub struct EntityConfig {
    name: String,
    endpoint: String,
    fields: Vec<FieldSpec>,
    #[serde(skip)]
    rules: BTreeMap<String, RuleChain>,
}

/// On-disk shape of an entity config.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntityConfigDocument {
    name: String,
    endpoint: String,
    fields: Vec<FieldSpec>,
}

impl EntityConfig {
    pub fn builder(name: &str, endpoint: &str) -> EntityConfigBuilder {
        EntityConfigBuilder {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: EntityConfigDocument = serde_json::from_str(json)
            .map_err(|e| GridError::Config(format!("invalid entity config: {}", e)))?;
        Self::from_document(doc)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GridError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn from_document(doc: EntityConfigDocument) -> Result<Self> {
        let mut builder = Self::builder(&doc.name, &doc.endpoint);
        builder.fields = doc.fields;
        builder.build()
    }

    /// Entity used by the binary when no config file is given.
    pub fn users_demo() -> Result<Self> {
        Self::builder("Users", "users")
            .field(FieldSpec::text("name", "Name").required())
            .field(
                FieldSpec::new("email", "Email", InputKind::Email)
                    .required()
                    .rule(RuleSpec::Email),
            )
            .field(
                FieldSpec::new("phone", "Phone", InputKind::Phone)
                    .rule(RuleSpec::pattern(r"^[0-9+()\-. ]{5,}$", "must be a phone number")),
            )
            .field(FieldSpec::number("age", "Age").rule(RuleSpec::range(0.0, 150.0)))
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Copy of the template used when a row is appended.
    pub fn empty_record(&self) -> EntityRecord {
        let mut record = EntityRecord::unpersisted();
        for field in &self.fields {
            record.set(&field.name, field.template_value());
        }
        record
    }

    /// Parses raw editor input according to the field's input kind.
    pub fn parse_input(&self, field: &str, raw: &str) -> Result<FieldValue> {
        let spec = self
            .field(field)
            .ok_or_else(|| GridError::UnknownField(field.to_string(), self.name.clone()))?;
        Ok(spec.kind.parse(raw))
    }

    /// First error of one field, `None` when valid or when the field is unknown.
    pub fn validate_field(&self, field: &str, value: Option<&FieldValue>) -> Option<String> {
        self.rules.get(field).and_then(|chain| chain.validate(value))
    }

    /// All field errors of a record, in field declaration order.
    pub fn validate_record(&self, record: &EntityRecord) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|f| {
                self.validate_field(&f.name, record.get(&f.name))
                    .map(|message| (f.name.clone(), message))
            })
            .collect()
    }
}

pub struct EntityConfigBuilder {
    name: String,
    endpoint: String,
    fields: Vec<FieldSpec>,
}

impl EntityConfigBuilder {
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<EntityConfig> {
        if self.name.trim().is_empty() {
            return Err(GridError::Config("entity name cannot be empty".to_string()));
        }

        let endpoint = self.endpoint.trim().trim_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(GridError::Config(format!(
                "entity '{}' needs an endpoint",
                self.name
            )));
        }
        if endpoint.contains(char::is_whitespace) {
            return Err(GridError::Config(format!(
                "endpoint '{}' must not contain whitespace",
                endpoint
            )));
        }

        if self.fields.is_empty() {
            return Err(GridError::Config(format!(
                "entity '{}' declares no fields",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        let mut rules = BTreeMap::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(GridError::Config("field name cannot be empty".to_string()));
            }
            if field.name == ID_KEY {
                return Err(GridError::Config(
                    "'id' is reserved for the record identifier".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(GridError::Config(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
            if let Some(default) = &field.default {
                if field.kind.is_numeric() && default.as_f64().is_none() && !default.is_blank() {
                    return Err(GridError::Config(format!(
                        "field '{}': default must be a number",
                        field.name
                    )));
                }
            }
            rules.insert(field.name.clone(), RuleChain::compile(field)?);
        }

        Ok(EntityConfig {
            name: self.name,
            endpoint,
            fields: self.fields,
            rules,
        })
    }
}

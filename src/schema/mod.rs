//! Entity configuration: field layout, input kinds and validation rules.

pub mod entity;
pub mod field;
pub mod rules;

pub use entity::{EntityConfig, EntityConfigBuilder};
pub use field::{FieldSpec, InputKind};
pub use rules::{RuleChain, RuleSpec, ValidationRule};

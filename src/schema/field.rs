use super::rules::RuleSpec;
use crate::core::FieldValue;
use serde::{Deserialize, Serialize};

/// How a field is edited; decides how raw input text becomes a value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    #[default]
    Text,
    Email,
    Phone,
    Number,
    Url,
}

impl InputKind {
    /// Converts raw editor input into a field value.
    ///
    /// Number inputs that do not parse are kept as text so the user sees what
    /// was typed; validation then reports the field as not numeric.
    pub fn parse(&self, raw: &str) -> FieldValue {
        match self {
            Self::Number => match raw.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => FieldValue::Number(n),
                _ => FieldValue::Text(raw.to_string()),
            },
            _ => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number)
    }
}

/// One column of an entity: wire name, display label, input kind and rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub kind: InputKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    pub fn new(name: &str, label: &str, kind: InputKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            rules: Vec::new(),
            default: None,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, InputKind::Text)
    }

    pub fn number(name: &str, label: &str) -> Self {
        Self::new(name, label, InputKind::Number)
    }

    pub fn rule(mut self, rule: RuleSpec) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn required(self) -> Self {
        self.rule(RuleSpec::Required)
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Value placed into freshly appended rows.
    pub fn template_value(&self) -> FieldValue {
        self.default
            .clone()
            .unwrap_or_else(|| FieldValue::Text(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_input_parses_or_keeps_text() {
        assert_eq!(InputKind::Number.parse(" 42 "), FieldValue::Number(42.0));
        assert_eq!(InputKind::Number.parse("4x"), FieldValue::Text("4x".into()));
        assert_eq!(InputKind::Text.parse("42"), FieldValue::Text("42".into()));
    }

    #[test]
    fn test_large_numbers_survive_display_and_parse() {
        for n in [1e20, -3e19, 9.5e18] {
            let shown = FieldValue::Number(n).to_string();
            assert_eq!(InputKind::Number.parse(&shown), FieldValue::Number(n), "{shown}");
        }
        assert_eq!(FieldValue::Number(1e20).to_string(), "100000000000000000000");
    }

    #[test]
    fn test_template_value_falls_back_to_empty_text() {
        let plain = FieldSpec::text("name", "Name");
        assert_eq!(plain.template_value(), FieldValue::Text(String::new()));

        let seeded = FieldSpec::number("age", "Age").default_value(18_i64);
        assert_eq!(seeded.template_value(), FieldValue::Number(18.0));
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&InputKind::Email).unwrap();
        assert_eq!(json, "\"email\"");
    }
}

//! Declarative field validation.
//!
//! Each field carries a list of [`RuleSpec`]s. At config build time the specs
//! compile into a [`RuleChain`] of [`ValidationRule`] objects; the chain
//! reports the first failing rule's message.

use super::field::{FieldSpec, InputKind};
use crate::core::{FieldValue, GridError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Serializable rule description as written in entity config files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum RuleSpec {
    Required,
    MinLength {
        len: usize,
    },
    MaxLength {
        len: usize,
    },
    Pattern {
        regex: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Email,
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
}

impl RuleSpec {
    pub fn pattern(regex: &str, message: &str) -> Self {
        Self::Pattern {
            regex: regex.to_string(),
            message: Some(message.to_string()),
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    fn compile(&self, field: &str) -> Result<Arc<dyn ValidationRule>> {
        let rule: Arc<dyn ValidationRule> = match self {
            Self::Required => Arc::new(RequiredRule),
            Self::MinLength { len } => Arc::new(LengthRule {
                min: Some(*len),
                max: None,
            }),
            Self::MaxLength { len } => Arc::new(LengthRule {
                min: None,
                max: Some(*len),
            }),
            Self::Pattern { regex, message } => Arc::new(PatternRule {
                regex: compile_regex(field, regex)?,
                message: message
                    .clone()
                    .unwrap_or_else(|| format!("must match {}", regex)),
            }),
            Self::Email => Arc::new(PatternRule {
                regex: compile_regex(field, EMAIL_PATTERN)?,
                message: "must be a valid email address".to_string(),
            }),
            Self::Range { min, max } => {
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(GridError::Config(format!(
                            "field '{}': range minimum {} exceeds maximum {}",
                            field, lo, hi
                        )));
                    }
                }
                Arc::new(RangeRule {
                    min: *min,
                    max: *max,
                })
            }
        };
        Ok(rule)
    }
}

fn compile_regex(field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| GridError::Config(format!("field '{}': invalid pattern: {}", field, e)))
}

/// A single check applied to a field value.
pub trait ValidationRule: Send + Sync + fmt::Debug {
    /// Returns the user-facing message when the value is not acceptable.
    fn check(&self, value: Option<&FieldValue>) -> std::result::Result<(), String>;
}

/// Rejects missing and blank values.
#[derive(Debug, Clone, Default)]
pub struct RequiredRule;

impl ValidationRule for RequiredRule {
    fn check(&self, value: Option<&FieldValue>) -> std::result::Result<(), String> {
        match value {
            Some(v) if !v.is_blank() => Ok(()),
            _ => Err("is required".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LengthRule {
    min: Option<usize>,
    max: Option<usize>,
}

impl ValidationRule for LengthRule {
    fn check(&self, value: Option<&FieldValue>) -> std::result::Result<(), String> {
        let Some(text) = present_text(value) else {
            return Ok(());
        };
        let len = text.chars().count();
        if let Some(min) = self.min {
            if len < min {
                return Err(format!("must be at least {} characters", min));
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return Err(format!("must be at most {} characters", max));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    message: String,
}

impl ValidationRule for PatternRule {
    fn check(&self, value: Option<&FieldValue>) -> std::result::Result<(), String> {
        match present_text(value) {
            Some(text) if !self.regex.is_match(&text) => Err(self.message.clone()),
            _ => Ok(()),
        }
    }
}

/// Requires a number; added implicitly for numeric inputs.
#[derive(Debug, Clone, Default)]
pub struct NumericRule;

impl ValidationRule for NumericRule {
    fn check(&self, value: Option<&FieldValue>) -> std::result::Result<(), String> {
        match value {
            Some(FieldValue::Text(s)) if !s.trim().is_empty() => Err("must be a number".to_string()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RangeRule {
    min: Option<f64>,
    max: Option<f64>,
}

impl ValidationRule for RangeRule {
    fn check(&self, value: Option<&FieldValue>) -> std::result::Result<(), String> {
        let Some(n) = value.and_then(FieldValue::as_f64) else {
            return Ok(());
        };
        if let Some(min) = self.min {
            if n < min {
                return Err(format!("must be at least {}", min));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(format!("must be at most {}", max));
            }
        }
        Ok(())
    }
}

/// Non-blank value rendered as text, `None` when there is nothing to check.
fn present_text(value: Option<&FieldValue>) -> Option<String> {
    match value {
        Some(v) if !v.is_blank() => Some(v.to_string()),
        _ => None,
    }
}

/// Compiled rules of one field, evaluated in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    rules: Vec<Arc<dyn ValidationRule>>,
}

impl RuleChain {
    pub fn compile(spec: &FieldSpec) -> Result<Self> {
        let mut rules = Vec::with_capacity(spec.rules.len() + 1);
        if spec.rules.contains(&RuleSpec::Required) {
            rules.push(RuleSpec::Required.compile(&spec.name)?);
        }
        if spec.kind == InputKind::Number {
            rules.push(Arc::new(NumericRule) as Arc<dyn ValidationRule>);
        }
        for rule in spec.rules.iter().filter(|r| **r != RuleSpec::Required) {
            rules.push(rule.compile(&spec.name)?);
        }
        Ok(Self { rules })
    }

    pub fn with_rules(rules: Vec<Arc<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    /// First failing rule's message, if any.
    pub fn validate(&self, value: Option<&FieldValue>) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.check(value).err())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(spec: FieldSpec) -> RuleChain {
        RuleChain::compile(&spec).unwrap()
    }

    #[test]
    fn test_required_runs_first() {
        let rules = chain(
            FieldSpec::text("email", "Email")
                .rule(RuleSpec::Email)
                .required(),
        );
        assert_eq!(rules.validate(None), Some("is required".to_string()));
        assert_eq!(
            rules.validate(Some(&FieldValue::from("  "))),
            Some("is required".to_string())
        );
        assert_eq!(
            rules.validate(Some(&FieldValue::from("nope"))),
            Some("must be a valid email address".to_string())
        );
        assert_eq!(rules.validate(Some(&FieldValue::from("a@b.io"))), None);
    }

    #[test]
    fn test_optional_format_rules_skip_blank_values() {
        let rules = chain(FieldSpec::text("phone", "Phone").rule(RuleSpec::pattern(
            r"^[0-9+\- ]+$",
            "must be a phone number",
        )));
        assert_eq!(rules.validate(Some(&FieldValue::from(""))), None);
        assert_eq!(
            rules.validate(Some(&FieldValue::from("call me"))),
            Some("must be a phone number".to_string())
        );
    }

    #[test]
    fn test_number_fields_reject_text_and_out_of_range() {
        let rules = chain(FieldSpec::number("age", "Age").rule(RuleSpec::range(0.0, 150.0)));
        assert_eq!(
            rules.validate(Some(&FieldValue::from("old"))),
            Some("must be a number".to_string())
        );
        assert_eq!(
            rules.validate(Some(&FieldValue::Number(151.0))),
            Some("must be at most 150".to_string())
        );
        assert_eq!(rules.validate(Some(&FieldValue::Number(30.0))), None);
    }

    #[test]
    fn test_length_bounds_count_chars() {
        let rules = chain(
            FieldSpec::text("code", "Code")
                .rule(RuleSpec::MinLength { len: 2 })
                .rule(RuleSpec::MaxLength { len: 3 }),
        );
        assert!(rules.validate(Some(&FieldValue::from("é"))).is_some());
        assert!(rules.validate(Some(&FieldValue::from("éé"))).is_none());
        assert!(rules.validate(Some(&FieldValue::from("abcd"))).is_some());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bad_regex = FieldSpec::text("x", "X").rule(RuleSpec::pattern("(", "bad"));
        assert!(RuleChain::compile(&bad_regex).is_err());

        let bad_range = FieldSpec::number("x", "X").rule(RuleSpec::range(5.0, 1.0));
        assert!(RuleChain::compile(&bad_range).is_err());
    }

    #[test]
    fn test_rule_spec_json_shape() {
        let rule: RuleSpec = serde_json::from_str(r#"{"rule": "range", "min": 1}"#).unwrap();
        assert_eq!(
            rule,
            RuleSpec::Range {
                min: Some(1.0),
                max: None
            }
        );
    }
}

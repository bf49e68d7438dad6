use crate::config::{EmptyValuePolicy, Policy, ScalarKinds};
use serde_json::Value;

/// Prefix of values that reference runtime state, e.g. `$.Attributes.Phone`.
pub const DYNAMIC_PREFIX: &str = "$.";
/// Opening delimiter of an emitted placeholder.
pub const PLACEHOLDER_OPEN: &str = "${";
/// Closing delimiter of an emitted placeholder.
pub const PLACEHOLDER_CLOSE: &str = "}";

/// Wraps a variable name in the placeholder delimiters: `${name}`.
pub fn placeholder(name: &str) -> String {
    format!("{}{}{}", PLACEHOLDER_OPEN, name, PLACEHOLDER_CLOSE)
}

/// Whether `value` is a string in one of the two reserved syntaxes.
pub fn is_reserved(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.starts_with(DYNAMIC_PREFIX) || s.starts_with(PLACEHOLDER_OPEN))
}

/// Decides whether a located value should be replaced by a placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityFilter {
    empty_values: EmptyValuePolicy,
    scalar_kinds: ScalarKinds,
}

impl EligibilityFilter {
    pub fn new(empty_values: EmptyValuePolicy, scalar_kinds: ScalarKinds) -> Self {
        Self {
            empty_values,
            scalar_kinds,
        }
    }

    pub fn from_policy(policy: &Policy) -> Self {
        Self::new(policy.empty_values, policy.scalar_kinds)
    }

    pub fn is_eligible(&self, value: &Value) -> bool {
        match value {
            Value::Array(_) | Value::Object(_) | Value::Null => false,
            Value::String(_) if is_reserved(value) => false,
            Value::String(s) => match self.empty_values {
                EmptyValuePolicy::Skip => !s.trim().is_empty(),
                EmptyValuePolicy::Variableize => true,
            },
            Value::Number(_) | Value::Bool(_) => self.scalar_kinds == ScalarKinds::AllScalars,
        }
    }
}

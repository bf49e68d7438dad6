use crate::config::{ElementNaming, Policy};
use crate::error::{Identity, NameCollisionError};
use crate::path::{FanOut, Location};
use crate::rules::Rule;
use ahash::AHashMap;
use serde_json::Value;

/// Builds variable names of the form `{block}_{rule}_{node id}[_{suffix}]`.
#[derive(Debug, Clone)]
pub struct NameSynthesizer {
    element_naming: ElementNaming,
    default_label: String,
}

impl Default for NameSynthesizer {
    fn default() -> Self {
        Self::from_policy(&Policy::default())
    }
}

impl NameSynthesizer {
    pub fn new(element_naming: ElementNaming, default_label: impl Into<String>) -> Self {
        Self {
            element_naming,
            default_label: default_label.into(),
        }
    }

    pub fn from_policy(policy: &Policy) -> Self {
        Self::new(policy.element_naming, policy.default_element_label.clone())
    }

    pub fn synthesize(&self, rule: &Rule, node_id: &str, suffix: Option<&str>) -> String {
        let mut name = format!("{}_{}_{}", to_snake_case(&rule.block), rule.name, node_id);
        if let Some(suffix) = suffix {
            name.push('_');
            name.push_str(suffix);
        }
        name
    }

    /// Suffix telling apart one of several locations a rule resolved to inside a node.
    ///
    /// Sequence positions become `{label}{n}` (1-based), with nested positions appended
    /// as `_{n}`; under `ElementNaming::ContentHash` the first position is replaced by a
    /// short digest of `value` and deeper positions are dropped. Mapping keys picked by a
    /// wildcard are appended in snake_case. Returns `None` when the location was not
    /// reached through any fan-out.
    pub fn element_suffix(&self, rule: &Rule, location: &Location, value: &Value) -> Option<String> {
        if location.fan_out.is_empty() {
            return None;
        }
        let label = rule.element_label.as_deref().unwrap_or(&self.default_label);
        let mut parts = Vec::with_capacity(location.fan_out.len());
        let mut first_position = true;

        for choice in &location.fan_out {
            match choice {
                FanOut::Key(key) => {
                    let key = to_snake_case(key);
                    parts.push(if key.is_empty() { "key".to_string() } else { key });
                }
                FanOut::Position(index) => match (self.element_naming, first_position) {
                    (ElementNaming::Positional, true) => parts.push(format!("{}{}", label, index + 1)),
                    (ElementNaming::Positional, false) => parts.push((index + 1).to_string()),
                    (ElementNaming::ContentHash, true) => {
                        parts.push(format!("{}_{}", label, content_hash(value)))
                    }
                    (ElementNaming::ContentHash, false) => {}
                },
            }
            if matches!(choice, FanOut::Position(_)) {
                first_position = false;
            }
        }
        Some(parts.join("_"))
    }

    /// Makes `suffix` unique within a node when another location of the same rule already
    /// produced it, e.g. wildcard keys `Tier` and `tier` both giving `tier`. The first
    /// location in document order keeps the plain suffix.
    pub fn disambiguate(&self, suffix: &str, location: &Location) -> String {
        let digest = content_hash(&Value::String(location.to_string()));
        format!("{}_{}", suffix, digest)
    }
}

/// First 8 hex characters of the blake3 digest of the value's JSON text.
pub fn content_hash(value: &Value) -> String {
    let digest = blake3::hash(value.to_string().as_bytes());
    digest.to_hex().as_str()[..8].to_string()
}

/// Converts `UpdateContactAttributes`, `Play prompt` or `DTMFInput` into
/// `update_contact_attributes`, `play_prompt` and `dtmf_input`.
pub fn to_snake_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 && !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Rule names and element labels end up verbatim in variable names.
pub fn is_valid_name_fragment(fragment: &str) -> bool {
    !fragment.is_empty()
        && fragment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Identifiers may only contain letters, digits, underscores and hyphens.
pub fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Run-scoped set of assigned variable names.
#[derive(Debug, Default)]
pub struct NameRegistry {
    assigned: AHashMap<String, Identity>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `name` for `identity`, or reports who already holds it.
    pub fn claim(&mut self, name: &str, identity: Identity) -> Result<(), NameCollisionError> {
        if let Some(existing) = self.assigned.get(name) {
            return Err(NameCollisionError {
                name: name.to_string(),
                existing: existing.clone(),
                requested: identity,
            });
        }
        self.assigned.insert(name.to_string(), identity);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.assigned.contains_key(name)
    }

    pub fn owner(&self, name: &str) -> Option<&Identity> {
        self.assigned.get(name)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

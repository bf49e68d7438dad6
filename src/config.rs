//! Run configuration.
//!
//! Everything that is a policy decision rather than fixed semantics lives here: what
//! counts as an empty value, which scalar kinds are variableized, how fanned-out
//! elements are named, which anomaly kinds are fatal, and where the engine finds
//! nodes inside a flow document. All of it can be set through the
//! `VariableizerBuilder` or loaded from a TOML file:
//!
//! ```toml
//! [policy]
//! empty_values = "skip"
//! scalar_kinds = "all_scalars"
//! element_naming = "positional"
//! fatal_kinds = ["name_collision"]
//!
//! [layout]
//! nodes_key = "Actions"
//! metadata_root = "Metadata.ActionMetadata"
//! ```

use crate::error::{ConfigError, LoadError};
use crate::naming::is_valid_name_fragment;
use crate::report::AnomalyKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How values that carry no content are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyValuePolicy {
    /// Empty strings, whitespace-only strings and nulls are left alone.
    #[default]
    Skip,
    /// Empty and whitespace-only strings are variableized too. Nulls are still skipped.
    Variableize,
}

/// Which scalar kinds are variableized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKinds {
    /// Strings, numbers and bools.
    #[default]
    AllScalars,
    StringsOnly,
}

/// How a fanned-out sequence element is told apart in its variable name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementNaming {
    /// `{label}{n}` with a 1-based position. Renames when the sequence is reordered.
    #[default]
    Positional,
    /// `{label}_{hash}` from the element's content. Survives reordering; a repeated element
    /// in the same node gets a second digest of its location appended.
    ContentHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub empty_values: EmptyValuePolicy,
    pub scalar_kinds: ScalarKinds,
    pub element_naming: ElementNaming,
    /// Label used for positional suffixes when a rule does not declare one.
    pub default_element_label: String,
    /// Anomaly kinds that make `AnomalyReport::has_fatal` return true.
    pub fatal_kinds: Vec<AnomalyKind>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            empty_values: EmptyValuePolicy::default(),
            scalar_kinds: ScalarKinds::default(),
            element_naming: ElementNaming::default(),
            default_element_label: "item".to_string(),
            fatal_kinds: vec![AnomalyKind::NameCollision],
        }
    }
}

impl Policy {
    /// Checks the parts of the policy that end up inside variable names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_name_fragment(&self.default_element_label) {
            return Err(ConfigError::InvalidElementLabel {
                key: "policy".to_string(),
                rule: "default_element_label".to_string(),
                label: self.default_element_label.clone(),
            });
        }
        Ok(())
    }
}

/// Where the engine finds nodes and their display metadata inside a flow document.
///
/// The defaults match an Amazon Connect contact flow export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowLayout {
    /// Top-level key holding the sequence of nodes.
    pub nodes_key: String,
    /// Key inside each node holding its node type.
    pub type_key: String,
    /// Key inside each node holding its identifier.
    pub identifier_key: String,
    /// Dotted path to the mapping of identifier -> display metadata.
    pub metadata_root: String,
}

impl Default for FlowLayout {
    fn default() -> Self {
        Self {
            nodes_key: "Actions".to_string(),
            type_key: "Type".to_string(),
            identifier_key: "Identifier".to_string(),
            metadata_root: "Metadata.ActionMetadata".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub policy: Policy,
    pub layout: FlowLayout,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, LoadError> {
        let config: Config = toml::from_str(content)?;
        config.policy.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

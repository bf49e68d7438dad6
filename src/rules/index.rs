use super::definition::{RawBlock, RawVar};
use super::jsonc::strip_comments;
use crate::error::{ConfigError, LoadError};
use crate::naming::is_valid_name_fragment;
use crate::path::{PathExpr, kind_name};
use ahash::AHashMap;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Lifecycle status of a rule. Draft rules are loaded but never applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RuleStatus {
    #[default]
    Active,
    Draft,
}

impl RuleStatus {
    fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "active" => Some(RuleStatus::Active),
            "draft" => Some(RuleStatus::Draft),
            _ => None,
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleStatus::Active => write!(f, "active"),
            RuleStatus::Draft => write!(f, "draft"),
        }
    }
}

/// A declaration that one value path of a node type is variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Node type the rule applies to.
    pub node_type: String,
    /// Block name used as the variable name prefix.
    pub block: String,
    /// Variable name fragment.
    pub name: String,
    pub status: RuleStatus,
    /// Where the value lives, relative to the node.
    pub path: PathExpr,
    /// Where the display copies live, relative to the node's metadata entry.
    pub metadata_paths: Vec<PathExpr>,
    /// Label for positional suffixes, e.g. `prompt` gives `prompt1`, `prompt2`...
    pub element_label: Option<String>,
}

impl Rule {
    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    /// `name @ path`, used to point at the rule in anomaly records.
    pub fn label(&self) -> String {
        format!("{} @ {}", self.name, self.path)
    }
}

/// Immutable lookup of rules keyed by node type. Insertion order is preserved both for
/// node types and for the rules of each node type.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    by_type: AHashMap<String, Vec<Rule>>,
    order: Vec<String>,
}

impl RuleIndex {
    /// Builds an index from decoded rule definitions.
    pub fn build(definitions: &Value) -> Result<Self, ConfigError> {
        let Value::Object(entries) = definitions else {
            return Err(ConfigError::NotAnObject {
                found: kind_name(definitions).to_string(),
            });
        };

        let mut index = RuleIndex::default();
        for (key, records) in entries {
            let Value::Array(records) = records else {
                return Err(ConfigError::NotASequence {
                    key: key.clone(),
                    found: kind_name(records).to_string(),
                });
            };
            for (position, record) in records.iter().enumerate() {
                index.add_record(key, position, record)?;
            }
        }

        debug!(
            node_types = index.order.len(),
            rules = index.len(),
            "built rule index"
        );
        Ok(index)
    }

    /// Parses plain JSON rule definitions.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let definitions: Value = serde_json::from_str(content)
            .map_err(|e| ConfigError::JsonParseError(e.to_string()))?;
        Self::build(&definitions)
    }

    /// Parses rule definitions that may contain comments and trailing commas.
    pub fn from_jsonc_str(content: &str) -> Result<Self, ConfigError> {
        Self::from_json_str(&strip_comments(content))
    }

    /// Loads a `.json` or `.jsonc` rule definitions file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_jsonc_str(&content)?)
    }

    /// All rules for `node_type`, drafts included, in declaration order.
    pub fn lookup(&self, node_type: &str) -> &[Rule] {
        self.by_type.get(node_type).map_or(&[], Vec::as_slice)
    }

    /// Only the rules of `node_type` that may be applied.
    pub fn active_rules<'a>(&'a self, node_type: &str) -> impl Iterator<Item = &'a Rule> + use<'a> {
        self.lookup(node_type).iter().filter(|rule| rule.is_active())
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.by_type.contains_key(node_type)
    }

    /// Node types in the order they were first declared.
    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Total number of rules, drafts included.
    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    fn add_record(&mut self, key: &str, position: usize, record: &Value) -> Result<(), ConfigError> {
        let Value::Object(fields) = record else {
            return Err(ConfigError::MalformedRecord {
                key: key.to_string(),
                index: position,
                message: format!("expected a mapping, found {}", kind_name(record)),
            });
        };

        if is_block_record(fields) {
            let block: RawBlock = decode(key, position, record)?;
            let node_type = block.exported_json_block_name.trim();
            if node_type.is_empty() {
                return Err(ConfigError::MissingField {
                    key: key.to_string(),
                    index: position,
                    field: "exportedJsonBlockName",
                });
            }
            let block_status = parse_status(key, "<block>", block.status.as_deref())?;
            let scope = format!("{}/{}", key, node_type);
            for (var_position, var) in block.vars.iter().enumerate() {
                if !var.is_object() {
                    return Err(ConfigError::MalformedRecord {
                        key: scope,
                        index: var_position,
                        message: format!("expected a mapping, found {}", kind_name(var)),
                    });
                }
                let raw: RawVar = decode(&scope, var_position, var)?;
                let rule = build_rule(
                    &scope,
                    var_position,
                    node_type,
                    key,
                    block_status,
                    raw,
                )?;
                self.insert(rule);
            }
        } else {
            let raw: RawVar = decode(key, position, record)?;
            let rule = build_rule(key, position, key, key, RuleStatus::Active, raw)?;
            self.insert(rule);
        }
        Ok(())
    }

    fn insert(&mut self, rule: Rule) {
        if !self.by_type.contains_key(&rule.node_type) {
            self.order.push(rule.node_type.clone());
        }
        self.by_type
            .entry(rule.node_type.clone())
            .or_default()
            .push(rule);
    }
}

fn is_block_record(fields: &Map<String, Value>) -> bool {
    fields.contains_key("exportedJsonBlockName")
        || fields.contains_key("exported_json_block_name")
        || fields.contains_key("vars")
}

fn decode<T: serde::de::DeserializeOwned>(
    key: &str,
    position: usize,
    record: &Value,
) -> Result<T, ConfigError> {
    serde_json::from_value(record.clone()).map_err(|e| ConfigError::MalformedRecord {
        key: key.to_string(),
        index: position,
        message: e.to_string(),
    })
}

fn parse_status(key: &str, rule: &str, status: Option<&str>) -> Result<RuleStatus, ConfigError> {
    match status {
        None => Ok(RuleStatus::Active),
        Some(text) => RuleStatus::parse(text).ok_or_else(|| ConfigError::UnknownStatus {
            key: key.to_string(),
            rule: rule.to_string(),
            status: text.to_string(),
        }),
    }
}

fn build_rule(
    key: &str,
    position: usize,
    node_type: &str,
    block: &str,
    inherited_status: RuleStatus,
    raw: RawVar,
) -> Result<Rule, ConfigError> {
    let metadata_texts = raw.all_metadata_paths();

    let name = raw
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(ConfigError::MissingField {
            key: key.to_string(),
            index: position,
            field: "name",
        })?;
    if !is_valid_name_fragment(&name) {
        return Err(ConfigError::InvalidRuleName {
            key: key.to_string(),
            rule: name,
        });
    }

    let path_text = raw
        .path
        .filter(|path| !path.trim().is_empty())
        .ok_or(ConfigError::MissingField {
            key: key.to_string(),
            index: position,
            field: "path",
        })?;
    let invalid_path = |source| ConfigError::InvalidPath {
        key: key.to_string(),
        rule: name.clone(),
        source,
    };
    let path = PathExpr::parse(&path_text).map_err(invalid_path)?;
    let metadata_paths = metadata_texts
        .iter()
        .map(|text| PathExpr::parse(text).map_err(invalid_path))
        .collect::<Result<Vec<_>, _>>()?;

    let status = match raw.status.as_deref() {
        Some(_) => parse_status(key, &name, raw.status.as_deref())?,
        None => inherited_status,
    };

    let element_label = raw
        .element_label
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty());
    if let Some(label) = element_label.as_deref().filter(|l| !is_valid_name_fragment(l)) {
        return Err(ConfigError::InvalidElementLabel {
            key: key.to_string(),
            rule: name,
            label: label.to_string(),
        });
    }

    Ok(Rule {
        node_type: node_type.to_string(),
        block: block.to_string(),
        name,
        status,
        path,
        metadata_paths,
        element_label,
    })
}

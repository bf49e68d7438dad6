use crate::path::Location;
use std::fmt;
use thiserror::Error;

/// Errors raised while building a `RuleIndex`. Any of these aborts the whole run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse rule definitions: {0}")]
    JsonParseError(String),

    #[error("Rule definitions must be an object keyed by node type, found {found}")]
    NotAnObject { found: String },

    #[error("Rules for '{key}' must be a sequence of rule records, found {found}")]
    NotASequence { key: String, found: String },

    #[error("Rule record #{index} under '{key}' is malformed: {message}")]
    MalformedRecord {
        key: String,
        index: usize,
        message: String,
    },

    #[error("Rule record #{index} under '{key}' is missing required field '{field}'")]
    MissingField {
        key: String,
        index: usize,
        field: &'static str,
    },

    #[error("Rule '{rule}' under '{key}' has an invalid path expression: {source}")]
    InvalidPath {
        key: String,
        rule: String,
        #[source]
        source: PathSyntaxError,
    },

    #[error("Rule '{rule}' under '{key}' has an unknown status '{status}' (expected 'active' or 'draft')")]
    UnknownStatus {
        key: String,
        rule: String,
        status: String,
    },

    #[error(
        "Rule name '{rule}' under '{key}' may only contain letters, digits and underscores"
    )]
    InvalidRuleName { key: String, rule: String },

    #[error(
        "Element label '{label}' of rule '{rule}' under '{key}' may only contain letters, digits and underscores"
    )]
    InvalidElementLabel {
        key: String,
        rule: String,
        label: String,
    },
}

/// Errors raised while parsing the textual form of a path expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathSyntaxError {
    #[error("path expression is empty")]
    Empty,

    #[error("empty segment at position {position} in '{path}'")]
    EmptySegment { path: String, position: usize },

    #[error("unclosed '[' in '{path}'")]
    UnclosedBracket { path: String },

    #[error("unexpected '{found}' after ']' in '{path}'")]
    TrailingCharacters { path: String, found: char },

    #[error("index '{index}' in '{path}' is not a non-negative integer")]
    InvalidIndex { path: String, index: String },
}

/// Errors raised while resolving a path expression against a concrete value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("segment #{position} ('{segment}') expects a mapping or sequence, but found {found}")]
    NotAContainer {
        position: usize,
        segment: String,
        found: &'static str,
    },
}

/// Who asked for a variable name: enough to point a human at the source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub node_type: String,
    pub node_id: String,
    pub rule: String,
    pub location: Location,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} rule '{}' at {}",
            self.node_type, self.node_id, self.rule, self.location
        )
    }
}

/// Two distinct source locations computed the same variable name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("variable name '{name}' requested by {requested} is already assigned to {existing}")]
pub struct NameCollisionError {
    pub name: String,
    pub existing: Identity,
    pub requested: Identity,
}

/// Errors raised by the loading helpers that read rules or configuration from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

use ahash::AHashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// The kinds of non-fatal deviations the engine records instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// The node type has no entry in the rule index.
    UnmappedNodeType,
    /// A rule's parameter path found nothing in a node, or could not be walked.
    PathResolutionFailure,
    /// Two distinct locations computed the same variable name.
    NameCollision,
    /// A declared metadata path was missing or did not line up with the parameter.
    MetadataMirrorMismatch,
    /// A node (or the node sequence itself) is missing required structure.
    MalformedNode,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnomalyKind::UnmappedNodeType => "unmapped node type",
            AnomalyKind::PathResolutionFailure => "path resolution failure",
            AnomalyKind::NameCollision => "name collision",
            AnomalyKind::MetadataMirrorMismatch => "metadata mirror mismatch",
            AnomalyKind::MalformedNode => "malformed node",
        };
        f.write_str(label)
    }
}

/// Where an anomaly happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnomalyContext {
    pub node_type: Option<String>,
    pub node_id: Option<String>,
    /// Rule name, path expression, or both (`rule @ path`).
    pub rule_or_path: Option<String>,
}

impl AnomalyContext {
    pub fn node(node_type: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            node_id: Some(node_id.into()),
            rule_or_path: None,
        }
    }

    pub fn with_rule(mut self, rule_or_path: impl Into<String>) -> Self {
        self.rule_or_path = Some(rule_or_path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    #[serde(flatten)]
    pub context: AnomalyContext,
    pub message: String,
}

/// Append-only log of anomalies for one run.
#[derive(Debug, Clone, Default)]
pub struct AnomalyReport {
    records: Vec<Anomaly>,
    fatal_kinds: AHashSet<AnomalyKind>,
}

impl AnomalyReport {
    pub fn new(fatal_kinds: impl IntoIterator<Item = AnomalyKind>) -> Self {
        Self {
            records: Vec::new(),
            fatal_kinds: fatal_kinds.into_iter().collect(),
        }
    }

    pub fn record(&mut self, kind: AnomalyKind, context: AnomalyContext, message: impl Into<String>) {
        let message = message.into();
        warn!(
            %kind,
            node_type = context.node_type.as_deref().unwrap_or("-"),
            node_id = context.node_id.as_deref().unwrap_or("-"),
            rule = context.rule_or_path.as_deref().unwrap_or("-"),
            "{}",
            message
        );
        self.records.push(Anomaly {
            kind,
            context,
            message,
        });
    }

    /// True if any recorded anomaly is of a kind configured as fatal.
    pub fn has_fatal(&self) -> bool {
        self.records
            .iter()
            .any(|anomaly| self.fatal_kinds.contains(&anomaly.kind))
    }

    pub fn is_fatal(&self, kind: AnomalyKind) -> bool {
        self.fatal_kinds.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anomaly> {
        self.records.iter()
    }

    pub fn of_kind(&self, kind: AnomalyKind) -> impl Iterator<Item = &Anomaly> {
        self.records.iter().filter(move |anomaly| anomaly.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records per kind, ordered by kind.
    pub fn count_by_kind(&self) -> Vec<(AnomalyKind, usize)> {
        self.records
            .iter()
            .map(|anomaly| anomaly.kind)
            .counts()
            .into_iter()
            .sorted()
            .collect()
    }

    /// Appends another report's records, keeping this report's fatal kinds.
    pub fn merge(&mut self, other: AnomalyReport) {
        self.records.extend(other.records);
    }
}

impl<'a> IntoIterator for &'a AnomalyReport {
    type Item = &'a Anomaly;
    type IntoIter = std::slice::Iter<'a, Anomaly>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

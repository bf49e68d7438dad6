use crate::config::{Config, FlowLayout, Policy};
use crate::eligibility::{DYNAMIC_PREFIX, EligibilityFilter, PLACEHOLDER_OPEN, placeholder};
use crate::error::Identity;
use crate::naming::{NameRegistry, NameSynthesizer};
use crate::path::{Location, PathExpr, get, get_mut, kind_name, resolve};
use crate::report::{AnomalyContext, AnomalyKind, AnomalyReport};
use crate::rules::{Rule, RuleIndex};
use serde::Serialize;
use serde_json::Value;
use ahash::AHashSet;
use tracing::{debug, info, warn};

pub mod flow;

use flow::{NodeView, visit_nodes};

/// Terminal state of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Every active rule was attempted.
    Done,
    /// No rule applies to the node type.
    Skipped,
    /// The node lacks a type or identifier.
    Failed,
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub nodes_seen: usize,
    pub nodes_done: usize,
    pub nodes_skipped: usize,
    pub nodes_failed: usize,
    pub substitutions: usize,
    pub mirrors: usize,
}

/// A value that was replaced by a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub variable: String,
    pub node_type: String,
    pub node_id: String,
    pub rule: String,
    pub location: Location,
    /// The value that was replaced, e.g. to seed a variables file.
    pub original: Value,
}

/// Everything a run produces besides the mutated tree.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: AnomalyReport,
    pub stats: RunStats,
    pub assignments: Vec<Assignment>,
}

impl RunOutcome {
    pub fn has_fatal(&self) -> bool {
        self.report.has_fatal()
    }
}

/// Run-scoped mutable state. Created at the start of `run` and consumed at its end.
struct RunState {
    registry: NameRegistry,
    report: AnomalyReport,
    stats: RunStats,
    assignments: Vec<Assignment>,
}

/// Applies a `RuleIndex` to flow documents, replacing variable values with placeholders.
///
/// A `Variableizer` holds no run state and can be shared across threads; every call to
/// [`Variableizer::run`] starts with a fresh name registry and anomaly report.
pub struct Variableizer<'a> {
    index: &'a RuleIndex,
    policy: Policy,
    layout: FlowLayout,
    filter: EligibilityFilter,
    names: NameSynthesizer,
}

pub struct VariableizerBuilder<'a> {
    index: &'a RuleIndex,
    policy: Policy,
    layout: FlowLayout,
}

impl<'a> VariableizerBuilder<'a> {
    pub fn new(index: &'a RuleIndex) -> Self {
        Self {
            index,
            policy: Policy::default(),
            layout: FlowLayout::default(),
        }
    }
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }
    pub fn with_layout(mut self, layout: FlowLayout) -> Self {
        self.layout = layout;
        self
    }
    pub fn with_config(self, config: Config) -> Self {
        self.with_policy(config.policy).with_layout(config.layout)
    }
    /// Finishes the engine. A policy whose default element label could not appear in a
    /// variable name falls back to the default label.
    pub fn build(mut self) -> Variableizer<'a> {
        if let Err(e) = self.policy.validate() {
            warn!(error = %e, "ignoring invalid default element label");
            self.policy.default_element_label = Policy::default().default_element_label;
        }
        Variableizer {
            index: self.index,
            filter: EligibilityFilter::from_policy(&self.policy),
            names: NameSynthesizer::from_policy(&self.policy),
            policy: self.policy,
            layout: self.layout,
        }
    }
}

impl<'a> Variableizer<'a> {
    pub fn builder(index: &'a RuleIndex) -> VariableizerBuilder<'a> {
        VariableizerBuilder::new(index)
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Variableizes `document` in place.
    pub fn run(&self, document: &mut Value) -> RunOutcome {
        let mut state = RunState {
            registry: NameRegistry::new(),
            report: AnomalyReport::new(self.policy.fatal_kinds.iter().copied()),
            stats: RunStats::default(),
            assignments: Vec::new(),
        };

        let visited = visit_nodes(document, &self.layout, |node| {
            let outcome = self.process_node(node, &mut state);
            state.stats.nodes_seen += 1;
            match outcome {
                NodeState::Done => state.stats.nodes_done += 1,
                NodeState::Skipped => state.stats.nodes_skipped += 1,
                NodeState::Failed => state.stats.nodes_failed += 1,
            }
        });
        if let Err(message) = visited {
            state.report.record(
                AnomalyKind::MalformedNode,
                AnomalyContext::default(),
                message,
            );
        }

        info!(
            nodes = state.stats.nodes_seen,
            substitutions = state.stats.substitutions,
            mirrors = state.stats.mirrors,
            anomalies = state.report.len(),
            "variableized flow"
        );
        RunOutcome {
            report: state.report,
            stats: state.stats,
            assignments: state.assignments,
        }
    }

    /// Variableizes a copy of `document`, leaving the input untouched.
    pub fn run_on_copy(&self, document: &Value) -> (Value, RunOutcome) {
        let mut copy = document.clone();
        let outcome = self.run(&mut copy);
        (copy, outcome)
    }

    fn process_node(&self, node: NodeView<'_>, state: &mut RunState) -> NodeState {
        let NodeView {
            position,
            node_type,
            node_id,
            body,
            mut display,
        } = node;

        let (Some(node_type), Some(node_id)) = (node_type.as_deref(), node_id.as_deref()) else {
            state.report.record(
                AnomalyKind::MalformedNode,
                AnomalyContext {
                    node_type: node_type.clone(),
                    node_id: node_id.clone(),
                    rule_or_path: None,
                },
                format!(
                    "node #{} has no string '{}' or '{}'",
                    position, self.layout.type_key, self.layout.identifier_key
                ),
            );
            return NodeState::Failed;
        };

        let rules = self.index.lookup(node_type);
        if rules.is_empty() {
            state.report.record(
                AnomalyKind::UnmappedNodeType,
                AnomalyContext::node(node_type, node_id),
                format!("no rules are defined for node type '{}'", node_type),
            );
            return NodeState::Skipped;
        }
        if !rules.iter().any(Rule::is_active) {
            debug!(node_type, node_id, "only draft rules for node type");
            return NodeState::Skipped;
        }

        for rule in rules.iter().filter(|rule| rule.is_active()) {
            let node = NodeRef { node_type, node_id };
            let written = self.apply_rule(rule, &node, body, state);
            if written.iter().all(Option::is_none) {
                continue;
            }
            for metadata_path in &rule.metadata_paths {
                self.mirror(rule, metadata_path, &node, &written, display.as_deref_mut(), state);
            }
        }
        NodeState::Done
    }

    /// Resolves, filters, names and writes one rule. Returns the placeholder written at
    /// each resolved location, or `None` where nothing was written.
    fn apply_rule(
        &self,
        rule: &Rule,
        node: &NodeRef<'_>,
        body: &mut Value,
        state: &mut RunState,
    ) -> Vec<Option<String>> {
        let context = || AnomalyContext::node(node.node_type, node.node_id).with_rule(rule.label());

        let locations = match resolve(body, &rule.path) {
            Ok(locations) if locations.is_empty() => {
                state.report.record(
                    AnomalyKind::PathResolutionFailure,
                    context(),
                    format!("path '{}' not found in node", rule.path),
                );
                return Vec::new();
            }
            Ok(locations) => locations,
            Err(e) => {
                state
                    .report
                    .record(AnomalyKind::PathResolutionFailure, context(), e.to_string());
                return Vec::new();
            }
        };

        let fanned = locations.len() > 1;
        let mut suffixes = AHashSet::new();
        let mut written = Vec::with_capacity(locations.len());
        for location in locations {
            let Some(value) = get(body, &location) else {
                written.push(None);
                continue;
            };
            if !self.filter.is_eligible(value) {
                written.push(None);
                continue;
            }

            let suffix = if fanned {
                self.names
                    .element_suffix(rule, &location, value)
                    .map(|suffix| {
                        if suffixes.contains(&suffix) {
                            self.names.disambiguate(&suffix, &location)
                        } else {
                            suffix
                        }
                    })
            } else {
                None
            };
            if let Some(suffix) = &suffix {
                suffixes.insert(suffix.clone());
            }
            let variable = self.names.synthesize(rule, node.node_id, suffix.as_deref());
            let identity = Identity {
                node_type: node.node_type.to_string(),
                node_id: node.node_id.to_string(),
                rule: rule.name.clone(),
                location: location.clone(),
            };
            if let Err(collision) = state.registry.claim(&variable, identity) {
                state
                    .report
                    .record(AnomalyKind::NameCollision, context(), collision.to_string());
                written.push(None);
                continue;
            }

            let original = value.clone();
            let text = placeholder(&variable);
            if let Some(slot) = get_mut(body, &location) {
                *slot = Value::String(text.clone());
            }
            debug!(variable = %variable, location = %location, "substituted value");
            state.stats.substitutions += 1;
            state.assignments.push(Assignment {
                variable,
                node_type: node.node_type.to_string(),
                node_id: node.node_id.to_string(),
                rule: rule.name.clone(),
                location,
                original,
            });
            written.push(Some(text));
        }
        written
    }

    /// Copies written placeholders into the node's display metadata at `metadata_path`.
    fn mirror(
        &self,
        rule: &Rule,
        metadata_path: &PathExpr,
        node: &NodeRef<'_>,
        written: &[Option<String>],
        display: Option<&mut Value>,
        state: &mut RunState,
    ) {
        let context = || {
            AnomalyContext::node(node.node_type, node.node_id)
                .with_rule(format!("{} @ {}", rule.name, metadata_path))
        };
        let mut mismatch = |message: String| {
            state
                .report
                .record(AnomalyKind::MetadataMirrorMismatch, context(), message)
        };

        let Some(display) = display else {
            mismatch(format!(
                "node has no display metadata, so '{}' cannot be mirrored",
                metadata_path
            ));
            return;
        };
        let targets = match resolve(display, metadata_path) {
            Ok(targets) if targets.is_empty() => {
                mismatch(format!("metadata path '{}' not found", metadata_path));
                return;
            }
            Ok(targets) => targets,
            Err(e) => {
                mismatch(e.to_string());
                return;
            }
        };
        if targets.len() != written.len() {
            mismatch(format!(
                "metadata path resolved to {} location(s) but the parameter path to {}",
                targets.len(),
                written.len()
            ));
            return;
        }

        let mut mirrored = 0;
        for (target, text) in targets.iter().zip(written) {
            let Some(text) = text else { continue };
            let Some(slot) = get_mut(display, target) else {
                continue;
            };
            match MirrorTarget::classify(slot, text) {
                MirrorTarget::Composite(kind) => {
                    mismatch(format!(
                        "metadata value at {} is {}, expected a scalar",
                        target, kind
                    ));
                }
                MirrorTarget::DynamicReference => {
                    mismatch(format!(
                        "metadata value at {} is a dynamic reference and was left unchanged",
                        target
                    ));
                }
                MirrorTarget::ForeignPlaceholder => {
                    mismatch(format!(
                        "metadata value at {} held a different placeholder and was overwritten",
                        target
                    ));
                    *slot = Value::String(text.clone());
                    mirrored += 1;
                }
                MirrorTarget::Writable => {
                    *slot = Value::String(text.clone());
                    mirrored += 1;
                }
            }
        }
        state.stats.mirrors += mirrored;
    }
}

/// The identifying strings of the node being processed.
struct NodeRef<'n> {
    node_type: &'n str,
    node_id: &'n str,
}

enum MirrorTarget {
    Composite(&'static str),
    DynamicReference,
    ForeignPlaceholder,
    Writable,
}

impl MirrorTarget {
    fn classify(current: &Value, placeholder: &str) -> Self {
        match current {
            Value::Array(_) | Value::Object(_) => MirrorTarget::Composite(kind_name(current)),
            Value::String(s) if s.starts_with(DYNAMIC_PREFIX) => MirrorTarget::DynamicReference,
            Value::String(s) if s.starts_with(PLACEHOLDER_OPEN) && s != placeholder => {
                MirrorTarget::ForeignPlaceholder
            }
            _ => MirrorTarget::Writable,
        }
    }
}

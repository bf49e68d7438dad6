use super::expression::{PathExpr, Segment};
use crate::error::ResolveError;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::trace;

/// One concrete step from a resolution root down to a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Step {
    Key(String),
    Index(usize),
}

/// The choice a fan-out segment made on the way to a location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum FanOut {
    /// Zero-based position inside a sequence.
    Position(usize),
    /// Key inside a mapping.
    Key(String),
}

/// A concrete place in a value tree, produced by resolving a `PathExpr`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub steps: Vec<Step>,
    #[serde(skip)]
    pub fan_out: Vec<FanOut>,
}

impl Location {
    pub fn root() -> Self {
        Self::default()
    }

    fn child(&self, step: Step, fan_out: Option<FanOut>) -> Self {
        let mut next = self.clone();
        next.steps.push(step);
        next.fan_out.extend(fan_out);
        next
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "<root>");
        }
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Key(key) if i == 0 => write!(f, "{}", key)?,
                Step::Key(key) => write!(f, ".{}", key)?,
                Step::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Resolves `path` against `root`, returning every location it denotes in document order.
///
/// Missing keys and out-of-range indices contribute no locations. Descending into a
/// scalar is an error, unless it happens below a fan-out, where one odd element simply
/// contributes nothing.
pub fn resolve(root: &Value, path: &PathExpr) -> Result<Vec<Location>, ResolveError> {
    let mut found = Vec::new();
    walk(root, path.segments(), 0, Location::root(), false, &mut found)?;
    trace!(path = %path, locations = found.len(), "resolved path");
    Ok(found)
}

fn walk(
    value: &Value,
    segments: &[Segment],
    position: usize,
    here: Location,
    fanned: bool,
    found: &mut Vec<Location>,
) -> Result<(), ResolveError> {
    let Some((segment, rest)) = segments.split_first() else {
        found.push(here);
        return Ok(());
    };

    match segment {
        Segment::Literal(key) => match value {
            Value::Object(map) => {
                if let Some(child) = map.get(key) {
                    let next = here.child(Step::Key(key.clone()), None);
                    walk(child, rest, position + 1, next, fanned, found)?;
                }
            }
            Value::Array(items) => {
                if let Some((index, child)) = key
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index).map(|child| (index, child)))
                {
                    let next = here.child(Step::Index(index), None);
                    walk(child, rest, position + 1, next, fanned, found)?;
                }
            }
            scalar if !fanned => {
                return Err(ResolveError::NotAContainer {
                    position,
                    segment: key.clone(),
                    found: kind_name(scalar),
                });
            }
            _ => {}
        },
        Segment::Wildcard | Segment::EachElement => match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let next = here.child(Step::Key(key.clone()), Some(FanOut::Key(key.clone())));
                    walk(child, rest, position + 1, next, true, found)?;
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    let next = here.child(Step::Index(index), Some(FanOut::Position(index)));
                    walk(child, rest, position + 1, next, true, found)?;
                }
            }
            _ => {}
        },
    }
    Ok(())
}

/// Reads the value at `location`, if it still exists.
pub fn get<'a>(root: &'a Value, location: &Location) -> Option<&'a Value> {
    location
        .steps
        .iter()
        .try_fold(root, |value, step| match (step, value) {
            (Step::Key(key), Value::Object(map)) => map.get(key),
            (Step::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        })
}

/// Mutable counterpart of [`get`].
pub fn get_mut<'a>(root: &'a mut Value, location: &Location) -> Option<&'a mut Value> {
    location
        .steps
        .iter()
        .try_fold(root, |value, step| match (step, value) {
            (Step::Key(key), Value::Object(map)) => map.get_mut(key),
            (Step::Index(index), Value::Array(items)) => items.get_mut(*index),
            _ => None,
        })
}

/// Short human name for the kind of a JSON value, used in error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

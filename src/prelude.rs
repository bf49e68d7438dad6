//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the variableizer crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use variableizer::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let index = RuleIndex::from_file("block-definitions.jsonc")?;
//! let flow_json = std::fs::read_to_string("flows/main.json")?;
//! let mut flow: serde_json::Value = serde_json::from_str(&flow_json)?;
//!
//! let outcome = Variableizer::builder(&index).build().run(&mut flow);
//! println!("{}", ReportFormatter::format_table(&outcome.report));
//! # Ok(())
//! # }
//! ```

// Core engine
pub use crate::engine::{Assignment, NodeState, RunOutcome, RunStats, Variableizer};
pub use crate::rules::{Rule, RuleIndex, RuleStatus};

// Building blocks
pub use crate::eligibility::{EligibilityFilter, placeholder};
pub use crate::naming::{NameRegistry, NameSynthesizer, is_valid_identifier};
pub use crate::path::{Location, PathExpr, Segment, resolve};

// Configuration
pub use crate::config::{Config, ElementNaming, EmptyValuePolicy, FlowLayout, Policy, ScalarKinds};

// Reporting
pub use crate::report::{Anomaly, AnomalyContext, AnomalyKind, AnomalyReport, ReportFormatter};

// Error types
pub use crate::error::{ConfigError, LoadError, NameCollisionError, PathSyntaxError, ResolveError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

//! # Variableizer - Rule-Driven Flow Templating Engine
//!
//! **Variableizer** turns static contact flow exports into parameterized templates. A
//! rule set declares, per node type, which value paths are environment specific; the
//! engine walks every node of a flow, replaces those values with `${name}`
//! placeholders, and keeps the node's display metadata in sync so the console shows
//! the same placeholder as the functional parameter.
//!
//! ## Core Workflow
//!
//! 1.  **Load Rules**: Build a [`RuleIndex`](rules::RuleIndex) from decoded rule
//!     definitions (JSON or JSONC).
//! 2.  **Configure**: Use [`Variableizer::builder`](engine::Variableizer::builder) to pick
//!     a policy (empty values, scalar kinds, element naming, fatal anomaly kinds) and a
//!     flow layout.
//! 3.  **Run**: Call `run` on a decoded flow. Eligible leaves are replaced in place and a
//!     [`RunOutcome`](engine::RunOutcome) carries the anomaly report, counters and every
//!     assignment that was made.
//! 4.  **Report**: Render the anomalies with [`ReportFormatter`](report::ReportFormatter).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use variableizer::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let index = RuleIndex::from_jsonc_str(
//!         r#"{
//!             // Outbound caller id for transfer blocks
//!             "CompleteOutboundCall": [
//!                 { "name": "caller_id_number", "path": "Parameters.CallerId.Number" }
//!             ]
//!         }"#,
//!     )?;
//!
//!     let mut flow = json!({
//!         "Actions": [{
//!             "Identifier": "abc-123",
//!             "Type": "CompleteOutboundCall",
//!             "Parameters": { "CallerId": { "Number": "+15551234567" } }
//!         }]
//!     });
//!
//!     let engine = Variableizer::builder(&index).build();
//!     let outcome = engine.run(&mut flow);
//!
//!     assert_eq!(
//!         flow["Actions"][0]["Parameters"]["CallerId"]["Number"],
//!         "${complete_outbound_call_caller_id_number_abc-123}"
//!     );
//!     println!("{}", ReportFormatter::format_table(&outcome.report));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod naming;
pub mod path;
pub mod prelude;
pub mod report;
pub mod rules;

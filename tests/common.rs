//! Common test utilities for building rule sets and flow documents.
use serde_json::{Value, json};
use variableizer::prelude::*;

/// A rule set covering every feature the engine supports.
///
/// * `X`: one literal path (the caller id example)
/// * `PlayPrompts`: element fan-out with a friendly label and a mirrored metadata list
/// * `UpdateContactAttributes`: wildcard over dynamically named attribute keys
/// * `MessageParticipant`: a plain text parameter mirrored into metadata
/// * `TransferToFlow`: the exported block-definitions shape, with one draft rule
#[allow(dead_code)]
pub fn sample_definitions() -> Value {
    json!({
        "X": [
            { "name": "caller_id_number", "path": "Parameters.CallerId.Number" }
        ],
        "PlayPrompts": [
            {
                "name": "message",
                "path": "Parameters.Prompts[]",
                "metadataPath": "prompts[]",
                "elementLabel": "prompt"
            }
        ],
        "UpdateContactAttributes": [
            { "name": "attribute", "path": "Parameters.Attributes.*" }
        ],
        "MessageParticipant": [
            { "name": "text", "path": "Parameters.Text", "metadataPath": "text" }
        ],
        "Transfer to flow": [
            {
                "exportedJsonBlockName": "TransferToFlow",
                "vars": [
                    {
                        "name": "flow_id",
                        "actionsRelativePathValue": "Parameters.ContactFlowId",
                        "metadataRelativePathKey": { "used": true, "paths": ["ContactFlow.id"] }
                    },
                    {
                        "name": "legacy",
                        "actionsRelativePathValue": "Parameters.Legacy",
                        "status": "draft"
                    }
                ]
            }
        ]
    })
}

#[allow(dead_code)]
pub fn sample_index() -> RuleIndex {
    RuleIndex::build(&sample_definitions()).expect("sample definitions should be valid")
}

/// Wraps a list of actions (and optional action metadata) into a flow document.
#[allow(dead_code)]
pub fn flow(actions: Vec<Value>, metadata: Value) -> Value {
    json!({
        "Version": "2019-10-30",
        "StartAction": actions
            .first()
            .and_then(|a| a.get("Identifier"))
            .cloned()
            .unwrap_or(Value::Null),
        "Metadata": { "ActionMetadata": metadata },
        "Actions": actions
    })
}

#[allow(dead_code)]
pub fn action(identifier: &str, node_type: &str, parameters: Value) -> Value {
    json!({
        "Identifier": identifier,
        "Type": node_type,
        "Parameters": parameters,
        "Transitions": {}
    })
}

/// A realistic flow touching every rule in `sample_definitions`.
#[allow(dead_code)]
pub fn sample_flow() -> Value {
    flow(
        vec![
            action(
                "greeting",
                "MessageParticipant",
                json!({ "Text": "Thanks for calling Example Corp." }),
            ),
            action(
                "menu-prompts",
                "PlayPrompts",
                json!({ "Prompts": ["Press 1 for sales", "Press 2 for support"] }),
            ),
            action(
                "set-attrs",
                "UpdateContactAttributes",
                json!({
                    "Attributes": {
                        "Queue": "Sales",
                        "Caller": "$.CustomerEndpoint.Address",
                        "Language": "en-US"
                    }
                }),
            ),
            action(
                "to-billing",
                "TransferToFlow",
                json!({
                    "ContactFlowId": "arn:aws:connect:us-east-1:123456789012:instance/abc/contact-flow/billing",
                    "Legacy": "keep-me"
                }),
            ),
            action("disconnect", "DisconnectParticipant", json!({})),
        ],
        json!({
            "greeting": { "position": { "x": 10, "y": 20 }, "text": "Thanks for calling Example Corp." },
            "menu-prompts": { "prompts": ["Press 1 for sales", "Press 2 for support"] },
            "to-billing": {
                "ContactFlow": {
                    "id": "arn:aws:connect:us-east-1:123456789012:instance/abc/contact-flow/billing",
                    "text": "Billing"
                }
            }
        }),
    )
}

/// Collects every string leaf that looks like a placeholder.
#[allow(dead_code)]
pub fn placeholders(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_placeholders(value, &mut found);
    found
}

#[allow(dead_code)]
fn collect_placeholders(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(s) if s.starts_with("${") => found.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_placeholders(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_placeholders(v, found)),
        _ => {}
    }
}

use crate::config::FlowLayout;
use serde_json::Value;

/// One node of a flow document, as handed to the engine.
pub struct NodeView<'a> {
    /// Position in the node sequence.
    pub position: usize,
    pub node_type: Option<String>,
    pub node_id: Option<String>,
    /// The node object itself; rule paths resolve against it.
    pub body: &'a mut Value,
    /// The node's entry under the metadata root, if there is one.
    pub display: Option<&'a mut Value>,
}

/// Calls `visit` for every node in `document`, in sequence order.
///
/// The node sequence is taken out of the document for the duration of the walk so that
/// each node and its display metadata can be borrowed mutably at the same time; it is
/// put back in place before returning, keeping the document's key order.
pub fn visit_nodes<F>(document: &mut Value, layout: &FlowLayout, mut visit: F) -> Result<usize, String>
where
    F: FnMut(NodeView<'_>),
{
    let mut nodes = match document.get_mut(&layout.nodes_key) {
        Some(slot) => std::mem::take(slot),
        None => {
            return Err(format!(
                "flow document has no '{}' node sequence",
                layout.nodes_key
            ));
        }
    };

    let result = match &mut nodes {
        Value::Array(items) => {
            let mut metadata = metadata_root_mut(document, &layout.metadata_root);
            for (position, body) in items.iter_mut().enumerate() {
                let node_type = string_field(body, &layout.type_key);
                let node_id = string_field(body, &layout.identifier_key);
                let display = match (&node_id, metadata.as_deref_mut()) {
                    (Some(id), Some(entries)) => entries.get_mut(id.as_str()),
                    _ => None,
                };
                visit(NodeView {
                    position,
                    node_type,
                    node_id,
                    body,
                    display,
                });
            }
            Ok(items.len())
        }
        other => Err(format!(
            "'{}' must be a sequence of nodes, found {}",
            layout.nodes_key,
            crate::path::kind_name(other)
        )),
    };

    if let Some(slot) = document.get_mut(&layout.nodes_key) {
        *slot = nodes;
    }
    result
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn metadata_root_mut<'a>(document: &'a mut Value, root: &str) -> Option<&'a mut Value> {
    root.split('.')
        .filter(|key| !key.is_empty())
        .try_fold(document, |value, key| value.get_mut(key))
        .filter(|value| value.is_object())
}

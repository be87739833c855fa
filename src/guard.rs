//! Recursive guard/autofill engine.
//!
//! Walk a JSON value against a shape table, keep every field whose runtime
//! type satisfies one of its declared union variants, and replace anything
//! missing or mismatched with a type-appropriate default. The engine never
//! fails: malformed values, malformed tables and cyclic type graphs all
//! degrade to a usable value instead of an error.
//!
//! Contract: the target is taken by value and the repaired value returned;
//! callers treat the input as consumed. One [`Visited`] set lives for one
//! top-level call, so repeated calls are independent and the result is a
//! pure function of `(target, schema)`.
pub mod resolve;
pub mod synth;

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::schema::{NodeId, Schema, SchemaNode};

// ------------------------------ Cycle guard ------------------------------- //

/// Per-invocation set of already-expanded node ids.
///
/// Bounds default expansion of self-referential schemas: the first repeat
/// visit on a branch truncates that branch to an empty object. Monotone
/// while synthesizing down one branch; resolver descents into *existing*
/// values fork a [`Visited::child`] copy instead, so a truncated subtree is
/// left alone on re-application (idempotence) without starving sibling
/// fields of the same type.
#[derive(Debug, Clone, Default)]
pub(crate) struct Visited {
    entered: HashSet<NodeId>,
}

impl Visited {
    /// Record `id`; false if it was already on this path.
    fn enter(&mut self, id: NodeId) -> bool {
        self.entered.insert(id)
    }

    pub(crate) fn seen(&self, id: NodeId) -> bool {
        self.entered.contains(&id)
    }

    /// Fork for a resolver descent into node `id`.
    pub(crate) fn child(&self, id: NodeId) -> Visited {
        let mut forked = self.clone();
        forked.entered.insert(id);
        forked
    }
}

// ------------------------------ Entry points ------------------------------ //

/// Repair `target` against the table's root node.
pub fn repair(schema: &Schema, target: Value) -> Value {
    repair_node(schema, schema.root, target, false)
}

/// Repair `target` against an explicit node. With `as_array` the engine
/// returns an empty array unconditionally: element types are declared but
/// not checked (use [`repair_elements`] to repair a top-level array).
pub fn repair_node(schema: &Schema, id: NodeId, target: Value, as_array: bool) -> Value {
    let mut visited = Visited::default();
    guard_value(schema, id, target, as_array, &mut visited)
}

/// Repair each element of a top-level array independently, each with its
/// own cycle guard.
pub fn repair_elements(schema: &Schema, targets: Vec<Value>) -> Vec<Value> {
    targets
        .into_iter()
        .map(|target| repair(schema, target))
        .collect()
}

// -------------------------------- Engine ---------------------------------- //

pub(crate) fn guard_value(
    schema: &Schema,
    id: NodeId,
    target: Value,
    as_array: bool,
    visited: &mut Visited,
) -> Value {
    if as_array {
        return Value::Array(Vec::new());
    }
    let Some(node) = schema.node(id) else {
        // dangling reference in the table; degrade to an empty shape
        return Value::Object(Map::new());
    };
    match node {
        // Alias nodes wrap a single type and expand by substitution; the
        // incoming value is discarded, never iterated field-by-field.
        SchemaNode::Alias { value } => synth::synthesize(schema, value, visited),
        SchemaNode::Fields { fields } => {
            let mut map = match target {
                Value::Object(map) => map,
                // field lookup needs an object; repair rather than reject
                _ => Map::new(),
            };
            for (key, field) in fields {
                if let Some(slot) = map.get_mut(key) {
                    let existing = slot.take();
                    *slot = resolve::resolve(schema, existing, field, visited);
                } else {
                    let Some(fallback) = field.fallback() else {
                        // empty union: nothing to synthesize from
                        continue;
                    };
                    if let Some(nested) = fallback.node_id() {
                        if !visited.enter(nested) {
                            // already expanding this node on the current
                            // branch: truncate and stop processing the rest
                            // of this node's fields (kept for compatibility)
                            map.insert(key.clone(), Value::Object(Map::new()));
                            return Value::Object(map);
                        }
                    }
                    let filled = synth::synthesize(schema, field, visited);
                    map.insert(key.clone(), filled);
                }
            }
            Value::Object(map)
        }
    }
}

// -------------------------------- Tests ----------------------------------- //

//! Union-variant resolution for fields that carry an existing value.

use serde_json::Value;

use super::{Visited, guard_value, synth};
use crate::schema::{FieldSchema, Keyword, NodeId, Schema, VariantKind};

/// Try the declared variants in order against `existing`.
///
/// Primitive (`Base`) and literal variants short-circuit on the first
/// match. Object-kind variants (`TypeLiteral`/`TypeReference`) do not:
/// every one encountered runs a recursive guard pass over the value, in
/// order, and the field counts as resolved after the first one tried. The
/// asymmetry is deliberate compatibility behavior (see DESIGN.md).
///
/// If nothing matches, the existing value is discarded outright and the
/// fallback default takes its place.
pub(crate) fn resolve(
    schema: &Schema,
    existing: Value,
    field: &FieldSchema,
    visited: &mut Visited,
) -> Value {
    let mut value = existing;
    let mut resolved = false;
    for variant in &field.variants {
        match &variant.kind {
            VariantKind::Base(keyword) => {
                if accepts_base(*keyword, &value, variant.is_array) {
                    resolved = true;
                    break;
                }
            }
            VariantKind::Literal(lit) => {
                if (variant.is_array && value.is_array()) || value == *lit {
                    resolved = true;
                    break;
                }
            }
            VariantKind::TypeLiteral(id) | VariantKind::TypeReference(id) => {
                value = guard_existing(schema, *id, value, variant.is_array, visited);
                resolved = true;
            }
        }
    }
    if resolved {
        value
    } else {
        synth::synthesize(schema, field, visited)
    }
}

/// Does the runtime JSON type satisfy the keyword? An array-flagged variant
/// accepts any array unchanged (element types are not validated), and the
/// keyword check still runs when no array is present, so a bare value of
/// the element type also satisfies an array-flagged variant (compatibility
/// behavior, see DESIGN.md). The
/// non-JSON keywords (`undefined`, `any`, `unknown`, `never`, `bigint`,
/// `symbol`) never match a runtime value.
fn accepts_base(keyword: Keyword, value: &Value, is_array: bool) -> bool {
    if is_array && value.is_array() {
        return true;
    }
    match keyword {
        Keyword::String => value.is_string(),
        Keyword::Number => value.is_number(),
        Keyword::Boolean => value.is_boolean(),
        Keyword::Null => value.is_null(),
        Keyword::Undefined
        | Keyword::Any
        | Keyword::Unknown
        | Keyword::Never
        | Keyword::Bigint
        | Keyword::Symbol => false,
    }
}

/// Recursive pass over a value that is already present. The descent runs
/// under a fork of the current cycle guard with `id` entered; if `id` is
/// already on the path the value is accepted as-is, which keeps repeated
/// application from re-expanding a truncated cycle.
fn guard_existing(
    schema: &Schema,
    id: NodeId,
    value: Value,
    is_array: bool,
    visited: &Visited,
) -> Value {
    if visited.seen(id) {
        return value;
    }
    if is_array {
        if let Value::Array(items) = value {
            return Value::Array(
                items
                    .into_iter()
                    .map(|item| guard_value(schema, id, item, false, &mut visited.child(id)))
                    .collect(),
            );
        }
    }
    guard_value(schema, id, value, false, &mut visited.child(id))
}

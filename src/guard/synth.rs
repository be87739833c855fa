//! Zero-value defaults, driven by a field's fallback (last) variant.

use serde_json::{Map, Value};

use super::{Visited, guard_value};
use crate::schema::{FieldSchema, Keyword, Schema, VariantKind};

/// Default for a field with no usable existing value. The authoritative
/// type is the **last** declared variant; an empty union yields null.
pub(crate) fn synthesize(schema: &Schema, field: &FieldSchema, visited: &mut Visited) -> Value {
    let Some(fallback) = field.fallback() else {
        return Value::Null;
    };
    if fallback.is_array {
        return Value::Array(Vec::new());
    }
    match &fallback.kind {
        VariantKind::Base(keyword) => base_default(*keyword),
        // the default for a literal/enum type is the literal itself
        VariantKind::Literal(value) => value.clone(),
        VariantKind::TypeLiteral(id) | VariantKind::TypeReference(id) => {
            guard_value(schema, *id, Value::Object(Map::new()), false, visited)
        }
    }
}

pub(crate) fn base_default(keyword: Keyword) -> Value {
    match keyword {
        Keyword::String => Value::String(String::new()),
        Keyword::Number => Value::from(0),
        Keyword::Boolean => Value::Bool(false),
        // `undefined` has no JSON spelling; it degrades to null along with
        // null itself and the non-JSON keywords (any/unknown/never/...)
        Keyword::Undefined
        | Keyword::Null
        | Keyword::Any
        | Keyword::Unknown
        | Keyword::Never
        | Keyword::Bigint
        | Keyword::Symbol => Value::Null,
    }
}

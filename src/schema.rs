//! Shape tables consumed by the guard engine.
//!
//! A [`Schema`] is a flat table of [`SchemaNode`]s plus a root index. Nested
//! object types point back into the table by [`NodeId`], so self-referential
//! type graphs (`type Node = { next?: Node }`) are directly expressible and
//! node identity is a plain integer.
//!
//! Tables are produced ahead of time by an external extractor over static
//! type declarations and decoded here as-is; this module is passive data
//! plus boundary validation. Union order inside a [`FieldSchema`] is the
//! declaration order of the source type and is semantically significant
//! (resolution precedence; last variant is the defaulting fallback).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Index into [`Schema::nodes`]. Stable identity for cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primitive type tags the extractor can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    String,
    Number,
    Boolean,
    Undefined,
    Null,
    Any,
    Unknown,
    Never,
    Bigint,
    Symbol,
}

/// One declared type alternative for a field.
///
/// `Literal` is an alias/enum-member type: the payload is the literal itself
/// and matching is by value equality. `TypeLiteral` (inline shape) and
/// `TypeReference` (named shape) both point at a nested node; the engine
/// treats them identically except where union resolution order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariantKind {
    Base(Keyword),
    Literal(Value),
    TypeLiteral(NodeId),
    TypeReference(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(flatten)]
    pub kind: VariantKind,
    /// Declared as an array of the payload type.
    #[serde(default)]
    pub is_array: bool,
}

impl Variant {
    pub fn base(keyword: Keyword) -> Self {
        Self { kind: VariantKind::Base(keyword), is_array: false }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self { kind: VariantKind::Literal(value.into()), is_array: false }
    }

    pub fn type_literal(id: NodeId) -> Self {
        Self { kind: VariantKind::TypeLiteral(id), is_array: false }
    }

    pub fn type_reference(id: NodeId) -> Self {
        Self { kind: VariantKind::TypeReference(id), is_array: false }
    }

    pub fn into_array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// The nested node this variant expands into, if it is an object kind.
    pub(crate) fn node_id(&self) -> Option<NodeId> {
        match self.kind {
            VariantKind::TypeLiteral(id) | VariantKind::TypeReference(id) => Some(id),
            VariantKind::Base(_) | VariantKind::Literal(_) => None,
        }
    }
}

/// The declared union for one field. `variants` keeps source declaration
/// order. `is_optional` is carried through from the extractor but the
/// engine fills optional fields like any other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub is_optional: bool,
}

impl FieldSchema {
    pub fn new(variants: Vec<Variant>) -> Self {
        Self { variants, is_optional: false }
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// The fallback variant used whenever a default must be synthesized
    /// without an existing value to test: always the **last** declared.
    pub fn fallback(&self) -> Option<&Variant> {
        self.variants.last()
    }
}

/// One shape in the table: either a set of named fields (interface / type
/// literal) or a type alias wrapping a single type, expanded by
/// substitution rather than field iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SchemaNode {
    Fields {
        /// Field order preserved from the source declaration.
        fields: IndexMap<String, FieldSchema>,
    },
    Alias {
        value: FieldSchema,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub nodes: Vec<SchemaNode>,
    pub root: NodeId,
}

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// Load-boundary failures. The engine itself never reports errors; a table
/// that slips past validation still only degrades (dangling ids behave as
/// empty shapes).
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("at JSON path {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema table is empty")]
    Empty,
    #[error("node {reference} is out of range (table has {len} nodes)")]
    DanglingNode { reference: NodeId, len: usize },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    /// Table with a single root node.
    pub fn single(node: SchemaNode) -> Self {
        Self { nodes: vec![node], root: NodeId(0) }
    }

    /// Append a node, returning its id.
    pub fn push(&mut self, node: SchemaNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.0 as usize)
    }

    /// Decode a schema document with JSON-path context in error messages,
    /// then validate node references.
    pub fn from_json_str(src: &str) -> Result<Self, SchemaError> {
        let de = &mut serde_json::Deserializer::from_str(src);
        let schema: Schema =
            serde_path_to_error::deserialize(de).map_err(|err| SchemaError::Decode {
                path: err.path().to_string(),
                source: err.into_inner(),
            })?;
        schema.validate()?;
        Ok(schema)
    }

    /// Reject empty tables and out-of-range node references. A courtesy for
    /// schema authors; nothing downstream relies on it.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.nodes.is_empty() {
            return Err(SchemaError::Empty);
        }
        let len = self.nodes.len();
        let check = |id: NodeId| {
            if (id.0 as usize) < len {
                Ok(())
            } else {
                Err(SchemaError::DanglingNode { reference: id, len })
            }
        };
        check(self.root)?;
        for node in &self.nodes {
            let fields: Box<dyn Iterator<Item = &FieldSchema> + '_> = match node {
                SchemaNode::Fields { fields } => Box::new(fields.values()),
                SchemaNode::Alias { value } => Box::new(std::iter::once(value)),
            };
            for field in fields {
                for variant in &field.variants {
                    if let Some(id) = variant.node_id() {
                        check(id)?;
                    }
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_extractor_document() {
        let src = r#"{
            "root": 0,
            "nodes": [
                {
                    "kind": "fields",
                    "fields": {
                        "id": { "variants": [ { "base": "string" } ] },
                        "tags": { "variants": [ { "base": "string", "isArray": true } ], "isOptional": true },
                        "status": { "variants": [ { "literal": "active" }, { "literal": "retired" } ] },
                        "owner": { "variants": [ { "typeReference": 1 } ] }
                    }
                },
                {
                    "kind": "alias",
                    "value": { "variants": [ { "base": "number" } ] }
                }
            ]
        }"#;
        let schema = Schema::from_json_str(src).unwrap();
        assert_eq!(schema.nodes.len(), 2);

        let SchemaNode::Fields { fields } = schema.node(NodeId(0)).unwrap() else {
            panic!("root should be a fields node");
        };
        // declaration order survives the round trip
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "tags", "status", "owner"]);

        let tags = &fields["tags"];
        assert!(tags.is_optional);
        assert!(tags.variants[0].is_array);
        assert_eq!(tags.variants[0].kind, VariantKind::Base(Keyword::String));

        let status = &fields["status"];
        assert_eq!(status.fallback().unwrap().kind, VariantKind::Literal(json!("retired")));

        assert_eq!(fields["owner"].variants[0].kind, VariantKind::TypeReference(NodeId(1)));
    }

    #[test]
    fn decode_error_names_json_path() {
        let src = r#"{ "root": 0, "nodes": [ { "kind": "fields", "fields": { "x": { "variants": "nope" } } } ] }"#;
        let err = Schema::from_json_str(src).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nodes"), "path missing from: {msg}");
    }

    #[test]
    fn validate_rejects_dangling_reference() {
        let schema = Schema::single(SchemaNode::Fields {
            fields: IndexMap::from([(
                "next".to_string(),
                FieldSchema::new(vec![Variant::type_reference(NodeId(7))]),
            )]),
        });
        match schema.validate() {
            Err(SchemaError::DanglingNode { reference, len }) => {
                assert_eq!(reference, NodeId(7));
                assert_eq!(len, 1);
            }
            other => panic!("expected dangling-node error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_empty_table() {
        let schema = Schema { nodes: Vec::new(), root: NodeId(0) };
        assert!(matches!(schema.validate(), Err(SchemaError::Empty)));
    }

    #[test]
    fn serialize_round_trips() {
        let mut schema = Schema::single(SchemaNode::Alias {
            value: FieldSchema::new(vec![
                Variant::base(Keyword::Number),
                Variant::literal("fallback"),
            ]),
        });
        schema.push(SchemaNode::Fields {
            fields: IndexMap::from([(
                "xs".to_string(),
                FieldSchema::new(vec![Variant::type_literal(NodeId(0)).into_array()]),
            )]),
        });
        let text = serde_json::to_string(&schema).unwrap();
        let back = Schema::from_json_str(&text).unwrap();
        assert_eq!(schema, back);
    }
}

//! json-mend: trust values from untyped boundaries.
//!
//! Given a JSON value and a shape table derived ahead of time from static
//! type declarations, [`repair`] walks the value recursively, keeps every
//! field that satisfies one of its declared union variants, and replaces
//! anything missing or mismatched with a type-appropriate default. The
//! engine never errors: bad input shapes, bad tables and self-referential
//! type graphs all degrade to a structurally valid value.

pub mod cli;
pub mod guard;
pub mod report;
pub mod schema;

pub use guard::{repair, repair_elements, repair_node};
pub use schema::{
    FieldSchema, Keyword, NodeId, Schema, SchemaError, SchemaNode, Variant, VariantKind,
};

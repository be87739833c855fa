//! Repair reports: what did the guard change?
//!
//! The engine repairs silently; the CLI `check` subcommand wants to show
//! its work. Diffing the value before and after a repair pass gives a
//! JSON-Pointer-addressed list of every field the guard added or replaced.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Repair {
    /// JSON Pointer to the repaired field (RFC 6901 escaping).
    pub path: String,
    /// None when the field was absent and synthesized.
    pub before: Option<Value>,
    pub after: Value,
}

impl Repair {
    pub fn was_added(&self) -> bool {
        self.before.is_none()
    }
}

/// Collect the repairs that turned `before` into `after`.
///
/// The guard never removes keys, so only additions and replacements are
/// reported; a key present in `before` but not `after` can only come from
/// diffing unrelated documents and is ignored.
pub fn diff(before: &Value, after: &Value) -> Vec<Repair> {
    let mut out = Vec::new();
    walk("", before, after, &mut out);
    out
}

fn walk(path: &str, before: &Value, after: &Value, out: &mut Vec<Repair>) {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            for (key, after_value) in a {
                let child = format!("{path}/{}", escape_pointer_token(key));
                match b.get(key) {
                    None => out.push(Repair {
                        path: child,
                        before: None,
                        after: after_value.clone(),
                    }),
                    Some(before_value) => walk(&child, before_value, after_value, out),
                }
            }
        }
        (Value::Array(b), Value::Array(a)) if b.len() == a.len() => {
            for (i, (before_value, after_value)) in b.iter().zip(a).enumerate() {
                let child = format!("{path}/{i}");
                walk(&child, before_value, after_value, out);
            }
        }
        _ => {
            if before != after {
                out.push(Repair {
                    path: if path.is_empty() { "/".to_string() } else { path.to_string() },
                    before: Some(before.clone()),
                    after: after.clone(),
                });
            }
        }
    }
}

// RFC 6901: `~` → `~0`, `/` → `~1`
fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

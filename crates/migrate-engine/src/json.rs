//! Path selection over JSON trees with ancestor tracking
//!
//! `serde_json::Value` has no parent links, so selections record the chain of
//! containers they passed through. Callers that need "the node that owns this
//! form" walk that chain upwards instead of relying on a JSON library's
//! traversal API.

use serde_json::{Map, Value};

/// Tagged view of a JSON value
#[derive(Debug, Clone, Copy)]
pub enum JsonNode<'a> {
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
    Scalar(&'a Value),
}

impl<'a> JsonNode<'a> {
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => JsonNode::Object(map),
            Value::Array(items) => JsonNode::Array(items),
            scalar => JsonNode::Scalar(scalar),
        }
    }
}

/// One step of a selection path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep<'p> {
    /// Descend into an object member
    Key(&'p str),
    /// Fan out over every element of an array
    Each,
}

/// A selected value plus every container above it, root first
#[derive(Debug, Clone)]
pub struct Located<'a> {
    pub value: &'a Value,
    ancestors: Vec<&'a Value>,
}

impl<'a> Located<'a> {
    /// Containers from the nearest parent up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = &'a Value> + '_ {
        self.ancestors.iter().rev().copied()
    }

    /// Nearest ancestor object satisfying `predicate`
    pub fn closest_object<F>(&self, predicate: F) -> Option<&'a Map<String, Value>>
    where
        F: Fn(&Map<String, Value>) -> bool,
    {
        self.ancestors().find_map(|ancestor| match JsonNode::of(ancestor) {
            JsonNode::Object(map) if predicate(map) => Some(map),
            _ => None,
        })
    }
}

/// Select every value reachable through `path`, in document order.
///
/// Steps that do not apply (a key on an array, `Each` on an object, a missing
/// member) simply yield nothing for that branch.
pub fn select<'a>(root: &'a Value, path: &[PathStep<'_>]) -> Vec<Located<'a>> {
    let mut out = Vec::new();
    let mut ancestors = Vec::new();
    walk(root, path, &mut ancestors, &mut out);
    out
}

fn walk<'a>(
    current: &'a Value,
    path: &[PathStep<'_>],
    ancestors: &mut Vec<&'a Value>,
    out: &mut Vec<Located<'a>>,
) {
    let Some((step, rest)) = path.split_first() else {
        out.push(Located {
            value: current,
            ancestors: ancestors.clone(),
        });
        return;
    };

    ancestors.push(current);
    match (step, JsonNode::of(current)) {
        (PathStep::Key(key), JsonNode::Object(map)) => {
            if let Some(child) = map.get(*key) {
                walk(child, rest, ancestors, out);
            }
        },
        (PathStep::Each, JsonNode::Array(items)) => {
            for item in items {
                walk(item, rest, ancestors, out);
            }
        },
        _ => {},
    }
    ancestors.pop();
}

/// First JSON pointer in `pointers` that resolves
pub fn first_pointer<'a>(root: &'a Value, pointers: &[&str]) -> Option<&'a Value> {
    pointers.iter().find_map(|pointer| root.pointer(pointer))
}

/// String member of an object, ignoring non-string values
pub fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Text form of a scalar: strings as-is, numbers and booleans rendered
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer id from a number or a numeric string; integral floats (`577.0`) count
pub fn integer_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        },
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

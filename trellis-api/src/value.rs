//! Structured values for attributes and data contexts.
//!
//! Layout attributes carry `Value`s. A value may be a binding into the data
//! context, in which case it is resolved per inflation pass and can be
//! re-resolved later against a different context without re-inflating.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::Layout;

/// An attribute or data value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / JSON null
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Text string
    String(String),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Nested structured data
    Object(ObjectValue),
    /// Reference into the data context, e.g. `@{user.name}`
    Binding(Binding),
    /// A nested layout (children of container types)
    Layout(Arc<Layout>),
}

static NULL: Value = Value::Null;

impl Value {
    /// Convert a JSON value. Strings of the form `@{...}` become bindings.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => match Binding::parse(&s) {
                Some(binding) => Value::Binding(binding),
                None => Value::String(s),
            },
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(obj) => Value::Object(ObjectValue::from_json_map(obj)),
        }
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, Value::Binding(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view; accepts `"true"` / `"false"` strings.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer view; accepts numeric strings and integral floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_layout(&self) -> Option<&Arc<Layout>> {
        match self {
            Value::Layout(layout) => Some(layout),
            _ => None,
        }
    }

    /// Resolve a binding against `data`; any other value is returned as is.
    pub fn resolve(&self, data: &ObjectValue, data_index: i32) -> Value {
        match self {
            Value::Binding(binding) => binding.evaluate(data, data_index),
            other => other.clone(),
        }
    }

    /// Plain-text rendering, used for text attributes and diagnostics.
    pub fn to_text(&self) -> String {
        let mut buf = String::new();
        self.write_text(&mut buf);
        buf
    }

    fn write_text(&self, buf: &mut String) {
        match self {
            Value::Null => {}
            Value::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
            Value::Int(n) => buf.push_str(&n.to_string()),
            Value::Float(f) => buf.push_str(&f.to_string()),
            Value::String(s) => buf.push_str(s),
            Value::Array(items) => {
                buf.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    item.write_text(buf);
                }
                buf.push(']');
            }
            Value::Object(obj) => {
                buf.push('{');
                for (i, (key, value)) in obj.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    buf.push_str(key);
                    buf.push_str(": ");
                    value.write_text(buf);
                }
                buf.push('}');
            }
            Value::Binding(binding) => buf.push_str(binding.expression()),
            Value::Layout(layout) => {
                buf.push('<');
                buf.push_str(layout.view_type());
                buf.push('>');
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjectValue> for Value {
    fn from(obj: ObjectValue) -> Self {
        Value::Object(obj)
    }
}

/// Data context: an insertion-ordered map from keys to values.
///
/// Owned by the caller of an inflation pass; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue(IndexMap<String, Value>);

impl ObjectValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a data context from a JSON object; non-objects give an empty context.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Object(map) => Self::from_json_map(map),
            _ => Self::new(),
        }
    }

    pub fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(
            map.into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for ObjectValue {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One step of a binding path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key, or array index when the current value is an array
    Key(String),
    /// `$index`: the data index of the current inflation pass
    DataIndex,
}

/// A bound expression into the data context, written `@{path.to.value}`.
///
/// Segments are separated by `.`; `items[2]` is shorthand for `items.2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    expression: String,
    segments: Vec<PathSegment>,
}

impl Binding {
    /// Parse `@{...}`; returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Binding> {
        let inner = text.trim().strip_prefix("@{")?.strip_suffix('}')?.trim();
        if inner.is_empty() {
            return None;
        }

        let mut segments = Vec::new();
        for part in inner.split('.') {
            for piece in part.split('[') {
                let piece = piece.trim_end_matches(']').trim();
                if piece.is_empty() {
                    continue;
                }
                segments.push(match piece {
                    "$index" => PathSegment::DataIndex,
                    key => PathSegment::Key(key.to_string()),
                });
            }
        }

        if segments.is_empty() {
            return None;
        }

        Some(Binding {
            expression: text.trim().to_string(),
            segments,
        })
    }

    /// The `@{...}` text as written.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Evaluate against a data context. Unresolvable paths give `Value::Null`.
    pub fn evaluate(&self, data: &ObjectValue, data_index: i32) -> Value {
        let (first, rest) = match self.segments.split_first() {
            Some(split) => split,
            None => return Value::Null,
        };

        let mut current = match first {
            PathSegment::DataIndex if rest.is_empty() => return Value::Int(i64::from(data_index)),
            PathSegment::DataIndex => return Value::Null,
            PathSegment::Key(key) => data.get(key).unwrap_or(&NULL),
        };

        for segment in rest {
            let next = match (segment, current) {
                (PathSegment::Key(key), Value::Object(obj)) => obj.get(key),
                (PathSegment::Key(key), Value::Array(items)) => {
                    key.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                (PathSegment::DataIndex, Value::Array(items)) => {
                    usize::try_from(data_index).ok().and_then(|i| items.get(i))
                }
                _ => None,
            };
            let Some(next) = next else {
                return Value::Null;
            };
            current = next;
        }

        current.clone()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

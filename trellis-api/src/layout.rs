//! Layout descriptions - compiled nodes and their raw JSON sources.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Value;

/// Errors raised while building or parsing layouts.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout type must not be empty")]
    EmptyType,

    #[error("attribute name must not be empty (layout type '{0}')")]
    EmptyAttributeName(String),

    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A resolved attribute: integer id plus value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub id: i32,
    pub value: Value,
}

impl Attribute {
    pub fn new(id: i32, value: impl Into<Value>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

/// Raw text of a declared attribute, retained so an editor can show and
/// change it later without re-parsing the layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub value: String,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Descriptor text for a JSON value: strings verbatim, everything else as JSON.
    pub fn from_json(name: impl Into<String>, value: &serde_json::Value) -> Self {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self::new(name, text)
    }
}

/// An immutable description of one UI node.
///
/// Attribute ids are already resolved to integers. Container children travel
/// as an attribute whose value is an array of `Value::Layout`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    view_type: String,
    attributes: Vec<Attribute>,
    tag_attributes: Option<Vec<AttributeDescriptor>>,
}

impl Layout {
    pub fn new(view_type: impl Into<String>) -> Result<Self, LayoutError> {
        let view_type = view_type.into();
        if view_type.trim().is_empty() {
            return Err(LayoutError::EmptyType);
        }
        Ok(Self {
            view_type,
            attributes: Vec::new(),
            tag_attributes: None,
        })
    }

    pub fn with_attribute(mut self, id: i32, value: impl Into<Value>) -> Self {
        self.attributes.push(Attribute::new(id, value));
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn with_tag_attributes(mut self, tags: Vec<AttributeDescriptor>) -> Self {
        self.tag_attributes = Some(tags);
        self
    }

    /// Registry key of this node.
    pub fn view_type(&self) -> &str {
        &self.view_type
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn tag_attributes(&self) -> Option<&[AttributeDescriptor]> {
        self.tag_attributes.as_deref()
    }

    pub fn has_bindings(&self) -> bool {
        self.attributes.iter().any(|a| a.value.is_binding())
    }
}

/// A layout node as written in JSON, before attribute names are resolved.
///
/// ```json
/// {
///   "type": "relative-layout",
///   "attributes": [ { "id": "padding", "value": 8 } ],
///   "children": [
///     { "type": "text", "attributes": [ { "id": "text", "value": "@{user.name}" } ] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSource {
    #[serde(rename = "type")]
    pub view_type: String,
    #[serde(default)]
    pub attributes: Vec<AttributeSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayoutSource>,
}

/// A raw attribute: name plus JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSource {
    pub id: String,
    pub value: serde_json::Value,
}

impl LayoutSource {
    pub fn from_json_str(text: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_type_rejected() {
        assert!(matches!(Layout::new(""), Err(LayoutError::EmptyType)));
        assert!(matches!(Layout::new("   "), Err(LayoutError::EmptyType)));
    }

    #[test]
    fn test_attributes_keep_declaration_order() {
        let layout = Layout::new("text")
            .unwrap()
            .with_attribute(3, "a")
            .with_attribute(1, "b")
            .with_attribute(3, "c");
        let ids: Vec<i32> = layout.attributes().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 1, 3]);
        assert!(layout.tag_attributes().is_none());
    }

    #[test]
    fn test_source_parses_with_defaults() {
        let source = LayoutSource::from_json_str(r#"{ "type": "text" }"#).unwrap();
        assert_eq!(source.view_type, "text");
        assert!(source.attributes.is_empty());
        assert!(source.children.is_empty());
    }

    #[test]
    fn test_source_keeps_attribute_order() {
        let source = LayoutSource::from_json_str(
            r#"{ "type": "text", "attributes": [
                { "id": "textSize", "value": 14 },
                { "id": "text", "value": "Hello" }
            ] }"#,
        )
        .unwrap();
        let names: Vec<&str> = source.attributes.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(names, vec!["textSize", "text"]);
    }

    #[test]
    fn test_descriptor_text() {
        let d = AttributeDescriptor::from_json("textSize", &serde_json::json!(14));
        assert_eq!(d.value, "14");
        let d = AttributeDescriptor::from_json("text", &serde_json::json!("Hi"));
        assert_eq!(d.value, "Hi");
    }

    #[test]
    fn test_malformed_source_is_json_error() {
        assert!(matches!(
            LayoutSource::from_json_str("{ \"attributes\": [] }"),
            Err(LayoutError::Json(_))
        ));
    }
}

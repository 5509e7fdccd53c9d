//! The `text` parser - read-only text widgets.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};

use trellis_api::Value;

use super::{resolve, AttributeSet, InflateRequest, ViewParser, ViewTypeParser};
use crate::error::InflateError;
use crate::widget::{View, Widget, WidgetRef};
use crate::{IdGenerator, Inflater};

const DEFAULT_TEXT_SIZE: f32 = 14.0;

const ATTRIBUTES: &[&str] = &["text", "textSize", "textColor"];

#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    pub text: String,
    pub text_size: f32,
    pub text_color: Option<String>,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            text: String::new(),
            text_size: DEFAULT_TEXT_SIZE,
            text_color: None,
        }
    }
}

#[derive(Debug)]
pub struct TextItem {
    view: View,
    state: Mutex<TextState>,
}

impl TextItem {
    pub fn new() -> Self {
        Self {
            view: View::new("text"),
            state: Mutex::new(TextState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, TextState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn text(&self) -> String {
        self.state().text.clone()
    }

    pub fn snapshot(&self) -> TextState {
        self.state().clone()
    }
}

impl Default for TextItem {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for TextItem {
    fn as_view(&self) -> &View {
        &self.view
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn summary(&self) -> String {
        format!("{:?}", self.state().text)
    }
}

pub struct TextParser {
    view: ViewParser,
    attributes: AttributeSet,
}

impl TextParser {
    pub fn new(ids: Arc<IdGenerator>) -> Self {
        let attributes = AttributeSet::new(&ids, ATTRIBUTES);
        Self {
            view: ViewParser::new(ids),
            attributes,
        }
    }
}

impl ViewTypeParser for TextParser {
    fn type_name(&self) -> &'static str {
        "text"
    }

    fn create_view(&self, _inflater: &Inflater, _request: InflateRequest<'_>) -> WidgetRef {
        Arc::new(TextItem::new())
    }

    fn handle_attribute(
        &self,
        widget: &WidgetRef,
        attribute: i32,
        value: &Value,
    ) -> Result<bool, InflateError> {
        let Some(name) = self.attributes.name(attribute) else {
            return Ok(self.view.apply(widget, attribute, value));
        };
        let Some(item) = widget.as_any().downcast_ref::<TextItem>() else {
            tracing::warn!(
                "text parser got a '{}' widget for '{}'",
                widget.as_view().kind(),
                name
            );
            return Ok(false);
        };
        let value = resolve(widget, value);
        let mut state = item.state();

        let handled = match name {
            "text" => {
                state.text = value.to_text();
                true
            }
            "textSize" => match value.as_f64() {
                Some(size) if size > 0.0 => {
                    state.text_size = size as f32;
                    true
                }
                _ => false,
            },
            "textColor" => match value {
                Value::String(color) => {
                    state.text_color = Some(color);
                    true
                }
                Value::Null => {
                    state.text_color = None;
                    true
                }
                _ => false,
            },
            _ => false,
        };
        Ok(handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::test_utils::test_helpers::TestSession;
    use crate::widget::downcast;
    use trellis_api::ObjectValue;

    #[test]
    fn test_text_attributes() {
        let session = TestSession::new();
        let widget = session.inflate(
            r##"{ "type": "text", "attributes": [
                { "id": "text", "value": "Hello" },
                { "id": "textSize", "value": "18" },
                { "id": "textColor", "value": "#333333" }
            ] }"##,
            &ObjectValue::new(),
        );

        let state = downcast::<TextItem>(&widget).unwrap().snapshot();
        assert_eq!(state.text, "Hello");
        assert_eq!(state.text_size, 18.0);
        assert_eq!(state.text_color.as_deref(), Some("#333333"));
    }

    #[test]
    fn test_text_binding_resolves_against_data() {
        let session = TestSession::new();
        let data = ObjectValue::new().with("greeting", "Hi there");
        let widget = session.inflate(
            r#"{ "type": "text", "attributes": [ { "id": "text", "value": "@{greeting}" } ] }"#,
            &data,
        );
        assert_eq!(downcast::<TextItem>(&widget).unwrap().text(), "Hi there");
    }

    #[test]
    fn test_text_falls_back_to_common_attributes() {
        let session = TestSession::new();
        let widget = session.inflate(
            r#"{ "type": "text", "attributes": [ { "id": "padding", "value": 6 } ] }"#,
            &ObjectValue::new(),
        );
        assert_eq!(widget.as_view().snapshot().padding, 6);
    }

    #[test]
    fn test_text_rejects_bad_size() {
        let session = TestSession::new();
        let parser = TextParser::new(session.ids.clone());
        let widget: WidgetRef = Arc::new(TextItem::new());
        let handled = parser
            .handle_attribute(&widget, session.attr("textSize"), &Value::from(-2))
            .unwrap();
        assert!(!handled);
        assert_eq!(downcast::<TextItem>(&widget).unwrap().snapshot().text_size, DEFAULT_TEXT_SIZE);
    }

    #[test]
    fn test_text_rejects_foreign_widget() {
        let session = TestSession::new();
        let parser = TextParser::new(session.ids.clone());
        let widget: WidgetRef = Arc::new(crate::parsers::ViewItem::new());
        let handled = parser
            .handle_attribute(&widget, session.attr("text"), &Value::from("x"))
            .unwrap();
        assert!(!handled);
    }
}

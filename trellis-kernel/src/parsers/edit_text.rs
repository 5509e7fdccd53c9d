//! The `edit-text` parser - editable text fields.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};

use trellis_api::Value;

use super::{resolve, AttributeSet, InflateRequest, ViewParser, ViewTypeParser};
use crate::error::InflateError;
use crate::widget::{View, Widget, WidgetRef};
use crate::{IdGenerator, Inflater};

const ATTRIBUTES: &[&str] = &["text", "hint", "inputType"];

/// Keyboard / content class of an editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Number,
    Email,
    Password,
    Phone,
    Multiline,
}

impl InputType {
    pub fn parse(text: &str) -> Option<InputType> {
        match text.trim() {
            "text" => Some(InputType::Text),
            "number" => Some(InputType::Number),
            "textEmailAddress" | "email" => Some(InputType::Email),
            "textPassword" | "password" => Some(InputType::Password),
            "phone" => Some(InputType::Phone),
            "textMultiLine" | "multiline" => Some(InputType::Multiline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditTextState {
    pub text: String,
    pub hint: Option<String>,
    pub input_type: InputType,
}

/// An editable field. Starts out non-focusable so an inflated form does not
/// grab focus on its own.
#[derive(Debug)]
pub struct EditTextItem {
    view: View,
    state: Mutex<EditTextState>,
}

impl EditTextItem {
    pub fn new() -> Self {
        let view = View::new("edit-text");
        view.update(|s| s.focusable = false);
        Self {
            view,
            state: Mutex::new(EditTextState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, EditTextState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn text(&self) -> String {
        self.state().text.clone()
    }

    pub fn hint(&self) -> Option<String> {
        self.state().hint.clone()
    }

    pub fn snapshot(&self) -> EditTextState {
        self.state().clone()
    }
}

impl Default for EditTextItem {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for EditTextItem {
    fn as_view(&self) -> &View {
        &self.view
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn summary(&self) -> String {
        let state = self.state();
        match &state.hint {
            Some(hint) => format!("{:?} hint={:?}", state.text, hint),
            None => format!("{:?}", state.text),
        }
    }
}

pub struct EditTextParser {
    view: ViewParser,
    attributes: AttributeSet,
}

impl EditTextParser {
    pub fn new(ids: Arc<IdGenerator>) -> Self {
        let attributes = AttributeSet::new(&ids, ATTRIBUTES);
        Self {
            view: ViewParser::new(ids),
            attributes,
        }
    }
}

impl ViewTypeParser for EditTextParser {
    fn type_name(&self) -> &'static str {
        "edit-text"
    }

    fn create_view(&self, _inflater: &Inflater, _request: InflateRequest<'_>) -> WidgetRef {
        Arc::new(EditTextItem::new())
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
        let Some(item) = widget.as_any().downcast_ref::<EditTextItem>() else {
            return Ok(false);
        };
        let value = resolve(widget, value);
        let mut state = item.state();

        let handled = match name {
            "text" => {
                state.text = value.to_text();
                true
            }
            "hint" => {
                state.hint = match value {
                    Value::Null => None,
                    other => Some(other.to_text()),
                };
                true
            }
            "inputType" => match value.as_str().and_then(InputType::parse) {
                Some(input_type) => {
                    state.input_type = input_type;
                    true
                }
                None => false,
            },
            _ => false,
        };
        Ok(handled)
    }
}

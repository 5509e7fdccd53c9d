//! Live attribute editing for design tools.

use std::sync::Arc;

use trellis_api::{AttributeDescriptor, LayoutError, Value};

use crate::error::EditError;
use crate::tags::TagTable;
use crate::widget::WidgetRef;
use crate::IdGenerator;

/// Lists and changes the attributes of inflated widgets.
///
/// Shares the tag table with the inflater that built the widgets.
#[derive(Debug, Clone)]
pub struct AttributeEditor {
    ids: Arc<IdGenerator>,
    tags: Arc<TagTable>,
}

impl AttributeEditor {
    pub fn new(ids: Arc<IdGenerator>, tags: Arc<TagTable>) -> Self {
        Self { ids, tags }
    }

    /// Declared attributes of `widget`, in declaration order.
    pub fn attributes(&self, widget: &WidgetRef) -> Vec<AttributeDescriptor> {
        self.tags
            .get(widget.as_view().widget_id())
            .map(|tags| tags.into_iter().collect())
            .unwrap_or_default()
    }

    /// Apply `value` to the attribute `name` through the widget's parser.
    ///
    /// On success the retained descriptor is replaced in place, or appended
    /// when the widget never declared that attribute.
    pub fn edit(&self, widget: &WidgetRef, name: &str, value: &serde_json::Value) -> Result<(), EditError> {
        let widget_id = widget.as_view().widget_id();
        let manager = widget
            .view_manager()
            .ok_or(EditError::NoManager(widget_id))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(LayoutError::EmptyAttributeName(manager.layout().view_type().to_string()).into());
        }

        let id = self.ids.get_unique(name);
        let parsed = Value::from_json(value.clone());
        if !manager.parser().handle_attribute(widget, id, &parsed)? {
            return Err(EditError::Rejected {
                name: name.to_string(),
                view_type: manager.layout().view_type().to_string(),
            });
        }

        tracing::debug!("edited {} {} = {}", widget_id, name, parsed);
        self.tags.upsert(widget_id, AttributeDescriptor::from_json(name, value));
        Ok(())
    }
}

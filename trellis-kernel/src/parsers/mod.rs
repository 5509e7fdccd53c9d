//! View type parsers - one per widget kind.
//!
//! A parser constructs its widget, builds the widget's manager, runs
//! post-creation setup and applies attributes one at a time. The inflater
//! drives parsers; parsers never inflate on their own except for container
//! children, which go back through the inflater.

mod edit_text;
mod registry;
mod relative_layout;
mod text;
mod view;

#[cfg(test)]
pub(crate) mod test_utils;

pub use edit_text::{EditTextItem, EditTextParser, EditTextState, InputType};
pub use registry::ParserRegistry;
pub use relative_layout::{LayoutTransition, RelativeLayoutItem, RelativeLayoutParser};
pub use text::{TextItem, TextParser, TextState};
pub use view::{ViewItem, ViewParser};

use std::collections::HashMap;
use std::sync::Arc;

use trellis_api::{Layout, ObjectValue, Value};

use crate::error::InflateError;
use crate::manager::Manager;
use crate::widget::WidgetRef;
use crate::{IdGenerator, Inflater};

/// Everything a parser gets to know about the node being inflated.
#[derive(Clone, Copy)]
pub struct InflateRequest<'a> {
    pub layout: &'a Arc<Layout>,
    pub data: &'a ObjectValue,
    pub parent: Option<&'a WidgetRef>,
    /// Position within a repeated collection, `-1` when not repeated.
    pub data_index: i32,
}

/// Constructs and configures one widget kind.
pub trait ViewTypeParser: Send + Sync {
    /// Registry key, e.g. `"text"`.
    fn type_name(&self) -> &'static str;

    /// Construct the widget. May hand back an existing widget, in which case
    /// the inflater skips manager creation and only re-applies attributes.
    fn create_view(&self, inflater: &Inflater, request: InflateRequest<'_>) -> WidgetRef;

    /// Build the manager for a freshly created widget.
    fn create_view_manager(
        &self,
        inflater: &Inflater,
        widget: &WidgetRef,
        parser: Arc<dyn ViewTypeParser>,
        request: InflateRequest<'_>,
    ) -> Manager {
        Manager::new(inflater, widget, parser, request)
    }

    /// Setup that needs the widget to exist and know its parent.
    /// Runs while the manager slot is locked; must not touch the slot.
    fn on_after_create_view(&self, widget: &WidgetRef, parent: Option<&WidgetRef>, _data_index: i32) {
        widget.as_view().attach_to(parent);
    }

    /// Apply one attribute. `Ok(false)` means the attribute is unknown to this
    /// parser or its value cannot be applied; that is never fatal. Errors are
    /// reserved for construction failures (a child that cannot be inflated).
    fn handle_attribute(
        &self,
        widget: &WidgetRef,
        attribute: i32,
        value: &Value,
    ) -> Result<bool, InflateError>;
}

/// Attribute names a parser understands, resolved to session ids.
#[derive(Debug, Clone)]
pub struct AttributeSet {
    names: HashMap<i32, &'static str>,
}

impl AttributeSet {
    pub fn new(ids: &IdGenerator, names: &[&'static str]) -> Self {
        Self {
            names: names
                .iter()
                .map(|name| (ids.get_unique(name), *name))
                .collect(),
        }
    }

    pub fn name(&self, id: i32) -> Option<&'static str> {
        self.names.get(&id).copied()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.names.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Resolve a possibly bound value against the widget's data context.
///
/// Widgets without a manager have no data context; their bindings resolve
/// against an empty one.
pub fn resolve(widget: &WidgetRef, value: &Value) -> Value {
    match widget.view_manager() {
        Some(manager) => manager.resolve(value),
        None => value.resolve(&ObjectValue::new(), crate::NO_DATA_INDEX),
    }
}

/// Strip `@+id/` / `@id/` prefixes from a view id reference.
pub(crate) fn id_name(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix("@+id/")
        .or_else(|| text.strip_prefix("@id/"))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_set_maps_ids() {
        let ids = IdGenerator::new();
        let set = AttributeSet::new(&ids, &["text", "hint"]);
        assert_eq!(set.name(ids.get_unique("text")), Some("text"));
        assert_eq!(set.name(ids.get_unique("hint")), Some("hint"));
        assert!(!set.contains(ids.get_unique("padding")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_attribute_sets_share_ids() {
        let ids = IdGenerator::new();
        let a = AttributeSet::new(&ids, &["text"]);
        let b = AttributeSet::new(&ids, &["hint", "text"]);
        let text = ids.get("text").unwrap();
        assert!(a.contains(text) && b.contains(text));
    }

    #[test]
    fn test_id_name() {
        assert_eq!(id_name("@+id/title"), "title");
        assert_eq!(id_name("@id/title"), "title");
        assert_eq!(id_name(" title "), "title");
    }
}

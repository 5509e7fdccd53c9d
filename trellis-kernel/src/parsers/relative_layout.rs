//! The `relative-layout` parser - the container kind.
//!
//! Children arrive as a `children` attribute holding nested layouts. Each one
//! is inflated through the widget's own inflater with this widget as parent,
//! so a child failure aborts the whole inflation. Applying the attribute again
//! replaces the previous children.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};

use trellis_api::Value;

use super::{resolve, AttributeSet, InflateRequest, ViewParser, ViewTypeParser};
use crate::error::InflateError;
use crate::layouts::CHILDREN_ATTRIBUTE;
use crate::widget::{View, Widget, WidgetRef};
use crate::{IdGenerator, Inflater};

const ATTRIBUTES: &[&str] = &[CHILDREN_ATTRIBUTE, "gravity"];

const GRAVITIES: &[&str] = &[
    "top",
    "bottom",
    "left",
    "right",
    "start",
    "end",
    "center",
    "center_vertical",
    "center_horizontal",
];

/// Animation settings applied when children change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutTransition {
    pub changing: bool,
    pub disappearing: bool,
    pub duration_ms: u64,
}

impl Default for LayoutTransition {
    fn default() -> Self {
        Self {
            changing: true,
            disappearing: false,
            duration_ms: 180,
        }
    }
}

#[derive(Debug)]
pub struct RelativeLayoutItem {
    view: View,
    transition: LayoutTransition,
    gravity: Mutex<Vec<String>>,
}

impl RelativeLayoutItem {
    pub fn new() -> Self {
        Self {
            view: View::new("relative-layout"),
            transition: LayoutTransition::default(),
            gravity: Mutex::new(Vec::new()),
        }
    }

    pub fn transition(&self) -> LayoutTransition {
        self.transition
    }

    fn gravity_lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.gravity.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn gravity(&self) -> Vec<String> {
        self.gravity_lock().clone()
    }
}

impl Default for RelativeLayoutItem {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for RelativeLayoutItem {
    fn as_view(&self) -> &View {
        &self.view
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn summary(&self) -> String {
        let gravity = self.gravity_lock();
        if gravity.is_empty() {
            String::new()
        } else {
            format!("gravity={}", gravity.join("|"))
        }
    }
}

/// Parses `center|top` style gravity flags. Any unknown flag rejects the whole value.
fn parse_gravity(text: &str) -> Option<Vec<String>> {
    let flags: Vec<String> = text
        .split('|')
        .map(str::trim)
        .filter(|flag| !flag.is_empty())
        .map(str::to_string)
        .collect();
    if flags.is_empty() || flags.iter().any(|flag| !GRAVITIES.contains(&flag.as_str())) {
        return None;
    }
    Some(flags)
}

pub struct RelativeLayoutParser {
    view: ViewParser,
    attributes: AttributeSet,
}

impl RelativeLayoutParser {
    pub fn new(ids: Arc<IdGenerator>) -> Self {
        let attributes = AttributeSet::new(&ids, ATTRIBUTES);
        Self {
            view: ViewParser::new(ids),
            attributes,
        }
    }

    fn add_children(&self, widget: &WidgetRef, value: &Value) -> Result<bool, InflateError> {
        let Value::Array(children) = value else {
            return Ok(false);
        };
        let Some(manager) = widget.view_manager() else {
            tracing::debug!(
                "{} has no manager, cannot inflate children",
                widget.as_view().widget_id()
            );
            return Ok(false);
        };

        let Some(layouts) = children
            .iter()
            .map(Value::as_layout)
            .collect::<Option<Vec<_>>>()
        else {
            tracing::debug!("non-layout child given to {}", widget.as_view().widget_id());
            return Ok(false);
        };

        // Build the whole list before swapping it in, so a failed child
        // leaves the current children untouched.
        let data = manager.data();
        let mut inflated = Vec::with_capacity(layouts.len());
        for layout in layouts {
            inflated.push(manager.inflater().inflate_into(
                layout,
                &data,
                Some(widget),
                manager.data_index(),
            )?);
        }
        let previous = widget.as_view().replace_children(inflated);
        if !previous.is_empty() {
            tracing::debug!(
                "replaced {} children of {}",
                previous.len(),
                widget.as_view().widget_id()
            );
        }
        Ok(true)
    }
}

impl ViewTypeParser for RelativeLayoutParser {
    fn type_name(&self) -> &'static str {
        "relative-layout"
    }

    fn create_view(&self, _inflater: &Inflater, _request: InflateRequest<'_>) -> WidgetRef {
        Arc::new(RelativeLayoutItem::new())
    }

    fn handle_attribute(
        &self,
        widget: &WidgetRef,
        attribute: i32,
        value: &Value,
    ) -> Result<bool, InflateError> {
        match self.attributes.name(attribute) {
            Some(CHILDREN_ATTRIBUTE) => self.add_children(widget, value),
            Some(_gravity) => {
                let Some(item) = widget.as_any().downcast_ref::<RelativeLayoutItem>() else {
                    return Ok(false);
                };
                let value = resolve(widget, value);
                match value.as_str().and_then(parse_gravity) {
                    Some(flags) => {
                        *item.gravity_lock() = flags;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            None => Ok(self.view.apply(widget, attribute, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::test_utils::test_helpers::TestSession;
    use crate::parsers::TextItem;
    use crate::widget::{downcast, RelativeRule, RuleAnchor};
    use trellis_api::ObjectValue;

    const FORM: &str = r#"{
        "type": "relative-layout",
        "attributes": [ { "id": "gravity", "value": "center|top" } ],
        "children": [
            { "type": "text", "attributes": [
                { "id": "id", "value": "@+id/title" },
                { "id": "text", "value": "@{title}" }
            ] },
            { "type": "edit-text", "attributes": [
                { "id": "layout_below", "value": "@id/title" }
            ] }
        ]
    }"#;

    #[test]
    fn test_transition_defaults() {
        let item = RelativeLayoutItem::new();
        assert_eq!(
            item.transition(),
            LayoutTransition {
                changing: true,
                disappearing: false,
                duration_ms: 180
            }
        );
    }

    #[test]
    fn test_parse_gravity() {
        assert_eq!(
            parse_gravity("center | top"),
            Some(vec!["center".to_string(), "top".to_string()])
        );
        assert_eq!(parse_gravity("center|sideways"), None);
        assert_eq!(parse_gravity(""), None);
    }

    #[test]
    fn test_children_are_inflated_in_order() {
        let session = TestSession::new();
        let data = ObjectValue::new().with("title", "Sign in");
        let root = session.inflate(FORM, &data);

        let children = root.as_view().children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].as_view().kind(), "text");
        assert_eq!(children[1].as_view().kind(), "edit-text");
        assert_eq!(downcast::<TextItem>(&children[0]).unwrap().text(), "Sign in");

        let root_id = root.as_view().widget_id();
        for child in &children {
            assert_eq!(child.as_view().parent(), Some(root_id));
            assert_eq!(child.view_manager().unwrap().parent(), Some(root_id));
        }

        let title = session.ids.get_view_id("title").unwrap();
        let params = children[1].as_view().snapshot().layout_params.unwrap();
        assert_eq!(params.rules.get(&RelativeRule::Below), Some(&RuleAnchor::Sibling(title)));
        assert_eq!(
            downcast::<RelativeLayoutItem>(&root).unwrap().gravity(),
            vec!["center", "top"]
        );
    }

    #[test]
    fn test_children_share_data_index() {
        let session = TestSession::new();
        let layout = session.layout(FORM);
        let root = session
            .inflater
            .inflate_indexed(&layout, &ObjectValue::new(), 3)
            .unwrap();
        for child in root.as_view().children() {
            assert_eq!(child.view_manager().unwrap().data_index(), 3);
        }
    }

    #[test]
    fn test_child_failure_aborts_parent() {
        let session = TestSession::new();
        let layout = session.layout(
            r#"{ "type": "relative-layout", "children": [ { "type": "carousel" } ] }"#,
        );
        let err = session
            .inflater
            .inflate(&layout, &ObjectValue::new())
            .unwrap_err();
        assert!(matches!(err, InflateError::UnresolvedType(t) if t == "carousel"));
    }

    /// Container parser that hands back the same widget on every inflation.
    struct ReusedContainerParser {
        inner: RelativeLayoutParser,
        widget: Mutex<Option<WidgetRef>>,
    }

    impl ViewTypeParser for ReusedContainerParser {
        fn type_name(&self) -> &'static str {
            "reused"
        }

        fn create_view(&self, _inflater: &Inflater, _request: InflateRequest<'_>) -> WidgetRef {
            let mut widget = self.widget.lock().unwrap();
            widget
                .get_or_insert_with(|| Arc::new(RelativeLayoutItem::new()))
                .clone()
        }

        fn handle_attribute(
            &self,
            widget: &WidgetRef,
            attribute: i32,
            value: &Value,
        ) -> Result<bool, InflateError> {
            self.inner.handle_attribute(widget, attribute, value)
        }
    }

    fn reused_session() -> TestSession {
        TestSession::with_context(|builder, ids| {
            let mut parsers = crate::parsers::ParserRegistry::with_builtins(ids);
            parsers.register(ReusedContainerParser {
                inner: RelativeLayoutParser::new(ids.clone()),
                widget: Mutex::new(None),
            });
            builder.parsers(parsers)
        })
    }

    #[test]
    fn test_reinflating_a_reused_container_replaces_children() {
        let session = reused_session();
        let layout = session.layout(
            r#"{ "type": "reused", "children": [ { "type": "text", "attributes": [
                { "id": "text", "value": "@{title}" }
            ] } ] }"#,
        );

        let first = session
            .inflater
            .inflate(&layout, &ObjectValue::new().with("title", "one"))
            .unwrap();
        let old_child = first.as_view().children()[0].clone();
        let second = session
            .inflater
            .inflate(&layout, &ObjectValue::new().with("title", "two"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let children = second.as_view().children();
        assert_eq!(children.len(), 1);
        assert!(!Arc::ptr_eq(&children[0], &old_child));
        // the reused widget keeps its first manager, and with it the first data
        assert_eq!(downcast::<TextItem>(&children[0]).unwrap().text(), "one");
    }

    #[test]
    fn test_non_layout_children_are_rejected() {
        let session = TestSession::new();
        let root = session.inflate(FORM, &ObjectValue::new());
        let before = root.as_view().children();

        let parser = RelativeLayoutParser::new(session.ids.clone());
        let value = Value::Array(vec![Value::from("not a layout")]);
        let handled = parser
            .handle_attribute(&root, session.attr(CHILDREN_ATTRIBUTE), &value)
            .unwrap();
        assert!(!handled);

        let after = root.as_view().children();
        assert_eq!(after.len(), before.len());
        assert!(before.iter().zip(&after).all(|(a, b)| Arc::ptr_eq(a, b)));
    }

    #[test]
    fn test_editing_children_does_not_duplicate_them() {
        let session = TestSession::new();
        let root = session.inflate(FORM, &ObjectValue::new());
        let editor = crate::editor::AttributeEditor::new(session.ids.clone(), session.tags.clone());

        let err = editor
            .edit(&root, CHILDREN_ATTRIBUTE, &serde_json::json!([{ "type": "text" }]))
            .unwrap_err();
        assert!(matches!(err, crate::error::EditError::Rejected { .. }));
        assert_eq!(root.as_view().child_count(), 2);
    }

    #[test]
    fn test_children_need_a_manager() {
        let session = TestSession::new();
        let parser = RelativeLayoutParser::new(session.ids.clone());
        let widget: WidgetRef = Arc::new(RelativeLayoutItem::new());
        let handled = parser
            .handle_attribute(&widget, session.attr(CHILDREN_ATTRIBUTE), &Value::Array(vec![]))
            .unwrap();
        assert!(!handled);
    }
}

//! The `view` parser - plain views and the attributes every kind shares.

use std::any::Any;
use std::sync::Arc;

use trellis_api::Value;

use super::{id_name, resolve, AttributeSet, InflateRequest, ViewTypeParser};
use crate::error::InflateError;
use crate::widget::{Dimension, RelativeRule, RuleAnchor, View, Visibility, Widget, WidgetRef};
use crate::{IdGenerator, Inflater};

const ATTRIBUTES: &[&str] = &[
    "id",
    "layout_width",
    "layout_height",
    "visibility",
    "padding",
    "background",
    "enabled",
    "alpha",
    "layout_below",
    "layout_above",
    "layout_toLeftOf",
    "layout_toRightOf",
    "layout_alignParentTop",
    "layout_alignParentBottom",
    "layout_alignParentLeft",
    "layout_alignParentRight",
    "layout_centerInParent",
];

/// A widget with nothing but common view state.
#[derive(Debug)]
pub struct ViewItem {
    view: View,
}

impl ViewItem {
    pub fn new() -> Self {
        Self {
            view: View::new("view"),
        }
    }
}

impl Default for ViewItem {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ViewItem {
    fn as_view(&self) -> &View {
        &self.view
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Parser for `view`, and the shared handler the other parsers fall back to.
pub struct ViewParser {
    ids: Arc<IdGenerator>,
    attributes: AttributeSet,
}

impl ViewParser {
    pub fn new(ids: Arc<IdGenerator>) -> Self {
        let attributes = AttributeSet::new(&ids, ATTRIBUTES);
        Self { ids, attributes }
    }

    /// Apply a common attribute to any widget kind.
    pub fn apply(&self, widget: &WidgetRef, attribute: i32, value: &Value) -> bool {
        let Some(name) = self.attributes.name(attribute) else {
            return false;
        };
        let value = resolve(widget, value);
        let view = widget.as_view();

        match name {
            "id" => match value.as_str().map(id_name) {
                Some(id) if !id.is_empty() => {
                    view.set_id(self.ids.view_id(id));
                    true
                }
                _ => false,
            },
            "layout_width" => Dimension::parse(&value)
                .map(|width| view.update_layout_params(|p| p.width = width))
                .is_some(),
            "layout_height" => Dimension::parse(&value)
                .map(|height| view.update_layout_params(|p| p.height = height))
                .is_some(),
            "visibility" => Visibility::parse(&value)
                .map(|visibility| view.update(|s| s.visibility = visibility))
                .is_some(),
            "padding" => value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(|padding| view.update(|s| s.padding = padding))
                .is_some(),
            "background" => match value {
                Value::Null => {
                    view.update(|s| s.background = None);
                    true
                }
                Value::String(color) => {
                    view.update(|s| s.background = Some(color));
                    true
                }
                _ => false,
            },
            "enabled" => value
                .as_bool()
                .map(|enabled| view.update(|s| s.enabled = enabled))
                .is_some(),
            "alpha" => value
                .as_f64()
                .map(|alpha| view.update(|s| s.alpha = alpha.clamp(0.0, 1.0) as f32))
                .is_some(),
            other => {
                if let Some(rule) = sibling_rule(other) {
                    self.apply_sibling_rule(view, rule, &value)
                } else if let Some(rule) = parent_rule(other) {
                    apply_parent_rule(view, rule, &value)
                } else {
                    false
                }
            }
        }
    }

    fn apply_sibling_rule(&self, view: &View, rule: RelativeRule, value: &Value) -> bool {
        match value.as_str().map(id_name) {
            Some(anchor) if !anchor.is_empty() => {
                let anchor = self.ids.view_id(anchor);
                view.update_layout_params(|p| {
                    p.rules.insert(rule, RuleAnchor::Sibling(anchor));
                });
                true
            }
            _ => false,
        }
    }
}

fn apply_parent_rule(view: &View, rule: RelativeRule, value: &Value) -> bool {
    let Some(enabled) = value.as_bool() else {
        return false;
    };
    view.update_layout_params(|p| {
        if enabled {
            p.rules.insert(rule, RuleAnchor::Parent);
        } else {
            p.rules.shift_remove(&rule);
        }
    });
    true
}

fn sibling_rule(name: &str) -> Option<RelativeRule> {
    match name {
        "layout_below" => Some(RelativeRule::Below),
        "layout_above" => Some(RelativeRule::Above),
        "layout_toLeftOf" => Some(RelativeRule::LeftOf),
        "layout_toRightOf" => Some(RelativeRule::RightOf),
        _ => None,
    }
}

fn parent_rule(name: &str) -> Option<RelativeRule> {
    match name {
        "layout_alignParentTop" => Some(RelativeRule::AlignParentTop),
        "layout_alignParentBottom" => Some(RelativeRule::AlignParentBottom),
        "layout_alignParentLeft" => Some(RelativeRule::AlignParentLeft),
        "layout_alignParentRight" => Some(RelativeRule::AlignParentRight),
        "layout_centerInParent" => Some(RelativeRule::CenterInParent),
        _ => None,
    }
}

impl ViewTypeParser for ViewParser {
    fn type_name(&self) -> &'static str {
        "view"
    }

    fn create_view(&self, _inflater: &Inflater, _request: InflateRequest<'_>) -> WidgetRef {
        Arc::new(ViewItem::new())
    }

    fn handle_attribute(
        &self,
        widget: &WidgetRef,
        attribute: i32,
        value: &Value,
    ) -> Result<bool, InflateError> {
        Ok(self.apply(widget, attribute, value))
    }
}

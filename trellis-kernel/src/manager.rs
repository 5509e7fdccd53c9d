//! Per-widget live state.

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use trellis_api::{Layout, ObjectValue, Value};

use crate::error::InflateError;
use crate::parsers::{InflateRequest, ViewTypeParser};
use crate::widget::{Widget, WidgetId, WidgetRef};
use crate::Inflater;

/// Live companion of a widget: the data context it was inflated with, its
/// position in a repeated collection, its parent, and the parser and layout
/// needed to re-apply attributes later.
///
/// Created by the widget's parser and attached exactly once by the inflater.
pub struct Manager {
    inflater: Inflater,
    widget: Weak<dyn Widget>,
    widget_id: WidgetId,
    layout: Arc<Layout>,
    parser: Arc<dyn ViewTypeParser>,
    parent: Option<WidgetId>,
    data_index: i32,
    data: RwLock<ObjectValue>,
}

impl Manager {
    pub fn new(
        inflater: &Inflater,
        widget: &WidgetRef,
        parser: Arc<dyn ViewTypeParser>,
        request: InflateRequest<'_>,
    ) -> Self {
        Self {
            inflater: inflater.clone(),
            widget: Arc::downgrade(widget),
            widget_id: widget.as_view().widget_id(),
            layout: request.layout.clone(),
            parser,
            parent: request.parent.map(|p| p.as_view().widget_id()),
            data_index: request.data_index,
            data: RwLock::new(request.data.clone()),
        }
    }

    /// The inflater that produced the widget; container parsers use it to
    /// inflate children.
    pub fn inflater(&self) -> &Inflater {
        &self.inflater
    }

    /// The managed widget, if it is still alive.
    pub fn widget(&self) -> Option<WidgetRef> {
        self.widget.upgrade()
    }

    pub fn widget_id(&self) -> WidgetId {
        self.widget_id
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn parser(&self) -> &Arc<dyn ViewTypeParser> {
        &self.parser
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub fn data_index(&self) -> i32 {
        self.data_index
    }

    /// Snapshot of the current data context.
    pub fn data(&self) -> ObjectValue {
        self.data.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Resolve `value` against the current data context.
    pub fn resolve(&self, value: &Value) -> Value {
        if !value.is_binding() {
            return value.clone();
        }
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        value.resolve(&data, self.data_index)
    }

    /// Swap in a new data context and re-apply every bound attribute of this
    /// widget and its descendants. Nothing is re-created or re-parented.
    ///
    /// Returns the number of bound attributes the parsers accepted.
    pub fn update(&self, data: ObjectValue) -> Result<usize, InflateError> {
        *self.data.write().unwrap_or_else(|e| e.into_inner()) = data.clone();

        let Some(widget) = self.widget() else {
            tracing::debug!("manager for {} outlived its widget", self.widget_id);
            return Ok(0);
        };

        let mut applied = 0;
        for attribute in self.layout.attributes() {
            if attribute.value.is_binding()
                && self
                    .parser
                    .handle_attribute(&widget, attribute.id, &attribute.value)?
            {
                applied += 1;
            }
        }

        for child in widget.as_view().children() {
            if let Some(manager) = child.view_manager() {
                applied += manager.update(data.clone())?;
            }
        }

        Ok(applied)
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("widget_id", &self.widget_id)
            .field("view_type", &self.layout.view_type())
            .field("parser", &self.parser.type_name())
            .field("parent", &self.parent)
            .field("data_index", &self.data_index)
            .finish()
    }
}

//! The inflation engine.

use std::fmt;
use std::sync::Arc;

use trellis_api::{Layout, ObjectValue};

use crate::context::EditorContext;
use crate::error::InflateError;
use crate::parsers::{InflateRequest, ViewTypeParser};
use crate::tags::TagTable;
use crate::widget::WidgetRef;
use crate::IdGenerator;

/// Data index of a widget that is not part of a repeated collection.
pub const NO_DATA_INDEX: i32 = -1;

/// Turns layouts plus data into widget trees.
///
/// Cheap to clone; clones share the context, id generator and tag table.
/// Inflation is synchronous and may run on several threads at once.
#[derive(Clone)]
pub struct Inflater {
    context: Arc<EditorContext>,
    ids: Arc<IdGenerator>,
    tags: Arc<TagTable>,
}

impl Inflater {
    pub fn new(context: Arc<EditorContext>, ids: Arc<IdGenerator>, tags: Arc<TagTable>) -> Self {
        Self { context, ids, tags }
    }

    pub fn context(&self) -> &Arc<EditorContext> {
        &self.context
    }

    pub fn id_generator(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    pub fn tags(&self) -> &Arc<TagTable> {
        &self.tags
    }

    pub fn get_parser(&self, view_type: &str) -> Option<Arc<dyn ViewTypeParser>> {
        self.context.get_parser(view_type)
    }

    /// Session-unique id for the view called `name`.
    pub fn unique_view_id(&self, name: &str) -> i32 {
        self.ids.view_id(name)
    }

    /// Inflate a root widget: no parent, not repeated.
    pub fn inflate(&self, layout: &Arc<Layout>, data: &ObjectValue) -> Result<WidgetRef, InflateError> {
        self.inflate_into(layout, data, None, NO_DATA_INDEX)
    }

    /// Inflate one item of a repeated collection.
    pub fn inflate_indexed(
        &self,
        layout: &Arc<Layout>,
        data: &ObjectValue,
        data_index: i32,
    ) -> Result<WidgetRef, InflateError> {
        self.inflate_into(layout, data, None, data_index)
    }

    /// Inflate `layout` against `data`.
    ///
    /// The parser for the layout type builds the widget. A manager is attached
    /// only if the widget has none yet, so a parser that hands back an existing
    /// widget keeps its manager. Declared attributes are then applied in order;
    /// a rejected attribute is never fatal. Any construction failure, including
    /// one in a nested child, aborts the call without returning a widget.
    pub fn inflate_into(
        &self,
        layout: &Arc<Layout>,
        data: &ObjectValue,
        parent: Option<&WidgetRef>,
        data_index: i32,
    ) -> Result<WidgetRef, InflateError> {
        let view_type = layout.view_type();
        let Some(parser) = self.get_parser(view_type) else {
            tracing::debug!("no parser registered for '{}'", view_type);
            return self.on_unknown_view_encountered(view_type, layout, data, data_index);
        };

        let request = InflateRequest {
            layout,
            data,
            parent,
            data_index,
        };
        let widget = parser.create_view(self, request);
        let widget_id = widget.as_view().widget_id();
        let verbose = self.context.config().verbose;

        let Ok(attached) = widget.as_view().manager_slot().attach_with(|| {
            parser.on_after_create_view(&widget, parent, data_index);
            let manager = parser.create_view_manager(self, &widget, parser.clone(), request);
            Ok::<_, std::convert::Infallible>(Arc::new(manager))
        });
        if verbose {
            match attached {
                Some(_) => tracing::debug!("attached '{}' manager to {}", view_type, widget_id),
                None => tracing::debug!("{} already has a manager, keeping it", widget_id),
            }
        }

        let attributes = layout.attributes();
        if !attributes.is_empty() {
            if let Some(tags) = layout.tag_attributes() {
                self.tags.record(widget_id, tags);
            }
            for attribute in attributes {
                let handled = parser.handle_attribute(&widget, attribute.id, &attribute.value)?;
                if verbose {
                    let name = self
                        .ids
                        .name_of(attribute.id)
                        .unwrap_or_else(|| attribute.id.to_string());
                    if handled {
                        tracing::debug!("{} '{}': {} = {}", widget_id, view_type, name, attribute.value);
                    } else {
                        tracing::debug!(
                            "{} '{}': attribute {} = {} rejected",
                            widget_id,
                            view_type,
                            name,
                            attribute.value
                        );
                    }
                }
            }
        }

        Ok(widget)
    }

    /// Inflate a layout from the context's layout store.
    pub fn inflate_named(&self, name: &str, data: &ObjectValue) -> Result<WidgetRef, InflateError> {
        self.inflate_named_into(name, data, None, NO_DATA_INDEX)
    }

    pub fn inflate_named_indexed(
        &self,
        name: &str,
        data: &ObjectValue,
        data_index: i32,
    ) -> Result<WidgetRef, InflateError> {
        self.inflate_named_into(name, data, None, data_index)
    }

    pub fn inflate_named_into(
        &self,
        name: &str,
        data: &ObjectValue,
        parent: Option<&WidgetRef>,
        data_index: i32,
    ) -> Result<WidgetRef, InflateError> {
        let layout = self
            .context
            .get_layout(name)
            .ok_or_else(|| InflateError::LayoutNotFound(name.to_string()))?;
        self.inflate_into(&layout, data, parent, data_index)
    }

    fn on_unknown_view_encountered(
        &self,
        view_type: &str,
        layout: &Arc<Layout>,
        data: &ObjectValue,
        data_index: i32,
    ) -> Result<WidgetRef, InflateError> {
        let Some(callback) = self.context.callback() else {
            return Err(InflateError::UnresolvedType(view_type.to_string()));
        };
        callback
            .on_unknown_view_type(self, view_type, layout, data, data_index)
            .ok_or_else(|| InflateError::CallbackReturnedNothing(view_type.to_string()))
    }
}

impl fmt::Debug for Inflater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inflater")
            .field("context", &self.context)
            .field("ids", &self.ids.len())
            .field("tagged_widgets", &self.tags.len())
            .finish()
    }
}

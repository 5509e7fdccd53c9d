//! Editor context - everything the inflater looks up while inflating.

use std::fmt;
use std::sync::Arc;

use trellis_api::{Layout, ObjectValue};

use crate::config::InflaterConfig;
use crate::layouts::LayoutStore;
use crate::parsers::{ParserRegistry, ViewTypeParser};
use crate::widget::WidgetRef;
use crate::Inflater;

/// Host fallback for layout types that have no registered parser.
///
/// Returning `None` violates the contract and aborts the inflation with
/// [`crate::InflateError::CallbackReturnedNothing`].
pub trait InflaterCallback: Send + Sync {
    fn on_unknown_view_type(
        &self,
        inflater: &Inflater,
        view_type: &str,
        layout: &Arc<Layout>,
        data: &ObjectValue,
        data_index: i32,
    ) -> Option<WidgetRef>;
}

impl<F> InflaterCallback for F
where
    F: Fn(&Inflater, &str, &Arc<Layout>, &ObjectValue, i32) -> Option<WidgetRef> + Send + Sync,
{
    fn on_unknown_view_type(
        &self,
        inflater: &Inflater,
        view_type: &str,
        layout: &Arc<Layout>,
        data: &ObjectValue,
        data_index: i32,
    ) -> Option<WidgetRef> {
        self(inflater, view_type, layout, data, data_index)
    }
}

/// Parser registry, layout store, unknown-type callback and config.
///
/// Read-only once built, so one context can serve concurrent inflations.
pub struct EditorContext {
    parsers: ParserRegistry,
    layouts: LayoutStore,
    callback: Option<Arc<dyn InflaterCallback>>,
    config: InflaterConfig,
}

impl EditorContext {
    pub fn builder() -> EditorContextBuilder {
        EditorContextBuilder::default()
    }

    pub fn get_parser(&self, view_type: &str) -> Option<Arc<dyn ViewTypeParser>> {
        self.parsers.get(view_type)
    }

    pub fn get_layout(&self, name: &str) -> Option<Arc<Layout>> {
        self.layouts.get(name)
    }

    pub fn callback(&self) -> Option<&Arc<dyn InflaterCallback>> {
        self.callback.as_ref()
    }

    pub fn config(&self) -> &InflaterConfig {
        &self.config
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    pub fn layouts(&self) -> &LayoutStore {
        &self.layouts
    }
}

impl fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorContext")
            .field("parsers", &self.parsers.len())
            .field("layouts", &self.layouts.len())
            .field("callback", &self.callback.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Default)]
pub struct EditorContextBuilder {
    parsers: ParserRegistry,
    layouts: LayoutStore,
    callback: Option<Arc<dyn InflaterCallback>>,
    config: InflaterConfig,
}

impl EditorContextBuilder {
    pub fn parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn layouts(mut self, layouts: LayoutStore) -> Self {
        self.layouts = layouts;
        self
    }

    pub fn callback(mut self, callback: impl InflaterCallback + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn config(mut self, config: InflaterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> EditorContext {
        EditorContext {
            parsers: self.parsers,
            layouts: self.layouts,
            callback: self.callback,
            config: self.config,
        }
    }
}

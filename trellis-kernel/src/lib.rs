//! Trellis Kernel - The layout inflation engine.
//!
//! This crate turns declarative layouts plus a data context into live widget
//! trees, including:
//! - Id generation shared by attribute names and view ids
//! - The parser registry and built-in widget kinds
//! - Managers that keep each widget's data context for re-binding
//! - The tag table and attribute editor used by design tools

pub mod config;
pub mod context;
pub mod editor;
pub mod layouts;
pub mod parsers;
pub mod tags;
pub mod widget;

mod error;
mod id;
mod inflater;
mod manager;

pub use config::{ConfigError, InflaterConfig};
pub use context::{EditorContext, EditorContextBuilder, InflaterCallback};
pub use editor::AttributeEditor;
pub use error::{EditError, InflateError};
pub use id::IdGenerator;
pub use inflater::{Inflater, NO_DATA_INDEX};
pub use layouts::{compile, compile_json, LayoutStore};
pub use manager::Manager;
pub use parsers::{ParserRegistry, ViewTypeParser};
pub use tags::TagTable;
pub use widget::{Widget, WidgetId, WidgetRef};

use std::sync::Arc;

/// One editing session: an inflater plus the editor sharing its tag table.
///
/// The id generator must be the one the context's parsers were built with.
#[derive(Debug, Clone)]
pub struct Session {
    ids: Arc<IdGenerator>,
    tags: Arc<TagTable>,
    inflater: Inflater,
}

impl Session {
    pub fn new(context: Arc<EditorContext>, ids: Arc<IdGenerator>) -> Self {
        let tags = Arc::new(TagTable::new());
        let inflater = Inflater::new(context, ids.clone(), tags.clone());
        Self {
            ids,
            tags,
            inflater,
        }
    }

    pub fn inflater(&self) -> &Inflater {
        &self.inflater
    }

    pub fn editor(&self) -> AttributeEditor {
        AttributeEditor::new(self.ids.clone(), self.tags.clone())
    }

    pub fn ids(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    pub fn tags(&self) -> &Arc<TagTable> {
        &self.tags
    }
}

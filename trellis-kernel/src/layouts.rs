//! Layout compilation and the named layout store.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use trellis_api::{AttributeDescriptor, Layout, LayoutError, LayoutSource, Value};

use crate::IdGenerator;

/// Attribute under which a container's child layouts are carried.
pub const CHILDREN_ATTRIBUTE: &str = "children";

/// Resolve a raw layout into a [`Layout`].
///
/// Attribute names become ids through `ids`, `@{...}` strings become
/// bindings, and the declared attributes are kept as tag attributes. Child
/// layouts are compiled recursively and appended as a trailing `children`
/// attribute.
pub fn compile(source: &LayoutSource, ids: &IdGenerator) -> Result<Layout, LayoutError> {
    let mut layout = Layout::new(source.view_type.as_str())?;

    if !source.attributes.is_empty() {
        let mut tags = Vec::with_capacity(source.attributes.len());
        for attribute in &source.attributes {
            let name = attribute.id.trim();
            if name.is_empty() {
                return Err(LayoutError::EmptyAttributeName(source.view_type.clone()));
            }
            let id = ids.get_unique(name);
            layout = layout.with_attribute(id, Value::from_json(attribute.value.clone()));
            tags.push(AttributeDescriptor::from_json(name, &attribute.value));
        }
        layout = layout.with_tag_attributes(tags);
    }

    if !source.children.is_empty() {
        let children = source
            .children
            .iter()
            .map(|child| compile(child, ids).map(|c| Value::Layout(Arc::new(c))))
            .collect::<Result<Vec<_>, _>>()?;
        layout = layout.with_attribute(ids.get_unique(CHILDREN_ATTRIBUTE), Value::Array(children));
    }

    Ok(layout)
}

/// Parse and compile a single layout from JSON text.
pub fn compile_json(text: &str, ids: &IdGenerator) -> Result<Layout, LayoutError> {
    compile(&LayoutSource::from_json_str(text)?, ids)
}

/// Named layouts available to `inflate_named`.
#[derive(Debug, Clone, Default)]
pub struct LayoutStore {
    layouts: HashMap<String, Arc<Layout>>,
}

impl LayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, layout: Layout) -> Arc<Layout> {
        let layout = Arc::new(layout);
        self.layouts.insert(name.into(), layout.clone());
        layout
    }

    pub fn get(&self, name: &str) -> Option<Arc<Layout>> {
        self.layouts.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.layouts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Load a `{ "name": layout, ... }` document. Returns how many layouts
    /// were added. Nothing is added if any layout fails to compile.
    pub fn load_json(&mut self, text: &str, ids: &IdGenerator) -> Result<usize, LayoutError> {
        let sources: IndexMap<String, LayoutSource> = serde_json::from_str(text)?;

        let compiled = sources
            .iter()
            .map(|(name, source)| compile(source, ids).map(|layout| (name.clone(), layout)))
            .collect::<Result<Vec<_>, _>>()?;

        let count = compiled.len();
        for (name, layout) in compiled {
            tracing::debug!("loaded layout '{}' ({})", name, layout.view_type());
            self.insert(name, layout);
        }
        Ok(count)
    }
}

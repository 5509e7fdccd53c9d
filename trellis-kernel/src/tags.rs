//! Side table of retained attribute descriptors, keyed by widget identity.
//!
//! The inflater records each widget's declared attributes here so an editing
//! tool can list and change them later without re-parsing the layout.

use indexmap::IndexSet;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use trellis_api::AttributeDescriptor;

use crate::widget::WidgetId;

/// Ordered, duplicate-free attribute descriptors of one widget.
pub type TagAttributes = IndexSet<AttributeDescriptor>;

#[derive(Debug, Default)]
pub struct TagTable {
    entries: Mutex<HashMap<WidgetId, TagAttributes>>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<WidgetId, TagAttributes>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the descriptors of `widget`. Later duplicates are dropped,
    /// first-occurrence order is kept.
    pub fn record(&self, widget: WidgetId, descriptors: &[AttributeDescriptor]) {
        let set: TagAttributes = descriptors.iter().cloned().collect();
        self.entries().insert(widget, set);
    }

    pub fn get(&self, widget: WidgetId) -> Option<TagAttributes> {
        self.entries().get(&widget).cloned()
    }

    pub fn contains(&self, widget: WidgetId) -> bool {
        self.entries().contains_key(&widget)
    }

    /// Set the descriptor named `descriptor.name`: replaced in place when the
    /// name is already present, appended otherwise.
    pub fn upsert(&self, widget: WidgetId, descriptor: AttributeDescriptor) {
        let mut entries = self.entries();
        let set = entries.entry(widget).or_default();

        let Some(position) = set.iter().position(|d| d.name == descriptor.name) else {
            set.insert(descriptor);
            return;
        };

        let rebuilt: TagAttributes = set
            .iter()
            .enumerate()
            .filter_map(|(i, d)| {
                if i == position {
                    Some(descriptor.clone())
                } else if d.name == descriptor.name {
                    // Other entries with the same name are superseded too.
                    None
                } else {
                    Some(d.clone())
                }
            })
            .collect();
        *set = rebuilt;
    }

    /// Forget a widget, e.g. when it leaves the tree.
    pub fn remove(&self, widget: WidgetId) -> Option<TagAttributes> {
        self.entries().remove(&widget)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

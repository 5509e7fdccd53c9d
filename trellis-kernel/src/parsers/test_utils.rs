//! Test utilities for parser testing.
//!
//! Provides a TestSession helper that sets up the id generator, tag table and
//! an inflater over the built-in parsers.

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Arc;

    use trellis_api::{Layout, ObjectValue};

    use crate::context::{EditorContext, EditorContextBuilder};
    use crate::layouts::compile_json;
    use crate::parsers::ParserRegistry;
    use crate::tags::TagTable;
    use crate::widget::WidgetRef;
    use crate::{IdGenerator, Inflater};

    /// A test session that owns all the resources an inflater needs.
    pub struct TestSession {
        pub ids: Arc<IdGenerator>,
        pub tags: Arc<TagTable>,
        pub inflater: Inflater,
    }

    impl TestSession {
        /// Built-in parsers, no layouts, no callback.
        pub fn new() -> Self {
            Self::with_context(|builder, _| builder)
        }

        /// Built-in parsers plus whatever `configure` adds.
        pub fn with_context(
            configure: impl FnOnce(EditorContextBuilder, &Arc<IdGenerator>) -> EditorContextBuilder,
        ) -> Self {
            let ids = Arc::new(IdGenerator::new());
            let tags = Arc::new(TagTable::new());
            let builder = EditorContext::builder().parsers(ParserRegistry::with_builtins(&ids));
            let context = Arc::new(configure(builder, &ids).build());
            let inflater = Inflater::new(context, ids.clone(), tags.clone());
            Self {
                ids,
                tags,
                inflater,
            }
        }

        /// Compile a layout from JSON.
        pub fn layout(&self, json: &str) -> Arc<Layout> {
            Arc::new(compile_json(json, &self.ids).expect("test layout should compile"))
        }

        /// Compile and inflate a layout with no parent and no data index.
        pub fn inflate(&self, json: &str, data: &ObjectValue) -> WidgetRef {
            let layout = self.layout(json);
            self.inflater
                .inflate(&layout, data)
                .expect("test layout should inflate")
        }

        pub fn attr(&self, name: &str) -> i32 {
            self.ids.get_unique(name)
        }
    }
}

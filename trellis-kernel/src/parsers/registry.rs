//! Parser registry for looking up view type parsers.

use std::collections::HashMap;
use std::sync::Arc;

use super::{EditTextParser, RelativeLayoutParser, TextParser, ViewParser, ViewTypeParser};
use crate::IdGenerator;

/// Maps layout type strings to parsers.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn ViewTypeParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in parsers registered.
    pub fn with_builtins(ids: &Arc<IdGenerator>) -> Self {
        let mut registry = Self::new();

        registry.register(ViewParser::new(ids.clone()));
        registry.register(TextParser::new(ids.clone()));
        registry.register(EditTextParser::new(ids.clone()));
        registry.register(RelativeLayoutParser::new(ids.clone()));

        registry
    }

    /// Register a parser under its own type name.
    pub fn register<P: ViewTypeParser + 'static>(&mut self, parser: P) {
        self.register_arc(Arc::new(parser));
    }

    pub fn register_arc(&mut self, parser: Arc<dyn ViewTypeParser>) {
        let name = parser.type_name();
        if self.parsers.insert(name.to_string(), parser).is_some() {
            tracing::debug!("replaced parser for '{}'", name);
        }
    }

    /// Register a parser under an additional type name.
    pub fn register_alias(&mut self, alias: impl Into<String>, parser: Arc<dyn ViewTypeParser>) {
        self.parsers.insert(alias.into(), parser);
    }

    /// Look up a parser by type. Absence is an ordinary outcome.
    pub fn get(&self, view_type: &str) -> Option<Arc<dyn ViewTypeParser>> {
        self.parsers.get(view_type).cloned()
    }

    /// Check if a type is registered.
    pub fn contains(&self, view_type: &str) -> bool {
        self.parsers.contains_key(view_type)
    }

    /// List all registered type names.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parsers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtins() -> ParserRegistry {
        ParserRegistry::with_builtins(&Arc::new(IdGenerator::new()))
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = ParserRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("text").is_none());
    }

    #[test]
    fn test_registry_contains_builtins() {
        let registry = builtins();
        assert!(registry.contains("view"));
        assert!(registry.contains("text"));
        assert!(registry.contains("edit-text"));
        assert!(registry.contains("relative-layout"));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_registry_does_not_contain_invalid() {
        let registry = builtins();
        assert!(!registry.contains("unknown"));
        assert!(!registry.contains(""));
        assert!(registry.get("TextView").is_none());
    }

    #[test]
    fn test_registered_parsers_have_correct_names() {
        let registry = builtins();
        for name in ["view", "text", "edit-text", "relative-layout"] {
            assert_eq!(registry.get(name).unwrap().type_name(), name);
        }
    }

    #[test]
    fn test_alias_shares_parser() {
        let mut registry = builtins();
        let text = registry.get("text").unwrap();
        registry.register_alias("TextView", text.clone());
        assert!(Arc::ptr_eq(&registry.get("TextView").unwrap(), &text));
    }

    #[test]
    fn test_names_returns_all() {
        let registry = builtins();
        let mut names: Vec<&str> = registry.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["edit-text", "relative-layout", "text", "view"]);
    }
}

//! Session-wide id generator.
//!
//! Attribute names and view ids (`"id": "@+id/title"`) share one generator.
//! View ids are keyed as `@id/<name>`, so a view called `text` gets a
//! different id from the `text` attribute.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Key prefix for view ids.
pub const VIEW_ID_PREFIX: &str = "@id/";

/// First id handed out. Zero is reserved for "no id".
const FIRST_ID: i32 = 1;

#[derive(Debug)]
struct IdTable {
    ids: HashMap<String, i32>,
    names: Vec<String>,
    next: i32,
}

/// Maps string identifiers to unique integers.
///
/// Ids grow monotonically and are never reused within a session. One
/// generator is created per editing session and passed around explicitly.
#[derive(Debug)]
pub struct IdGenerator {
    table: Mutex<IdTable>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(IdTable {
                ids: HashMap::new(),
                names: Vec::new(),
                next: FIRST_ID,
            }),
        }
    }

    fn table(&self) -> MutexGuard<'_, IdTable> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Id for `name`, allocating a fresh one the first time it is seen.
    pub fn get_unique(&self, name: &str) -> i32 {
        let mut table = self.table();
        if let Some(&id) = table.ids.get(name) {
            return id;
        }

        let id = table.next;
        table.next += 1;
        table.ids.insert(name.to_string(), id);
        table.names.push(name.to_string());
        id
    }

    /// Id previously allocated for `name`, without allocating.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.table().ids.get(name).copied()
    }

    /// Id for the view called `name`, allocated the first time.
    pub fn view_id(&self, name: &str) -> i32 {
        self.get_unique(&format!("{}{}", VIEW_ID_PREFIX, name))
    }

    /// Id of the view called `name`, if one was registered.
    pub fn get_view_id(&self, name: &str) -> Option<i32> {
        self.get(&format!("{}{}", VIEW_ID_PREFIX, name))
    }

    /// View name behind `id`. `None` for attribute ids.
    pub fn view_name_of(&self, id: i32) -> Option<String> {
        self.name_of(id)?
            .strip_prefix(VIEW_ID_PREFIX)
            .map(str::to_string)
    }

    /// Reverse lookup, used for diagnostics.
    pub fn name_of(&self, id: i32) -> Option<String> {
        let index = usize::try_from(id.checked_sub(FIRST_ID)?).ok()?;
        self.table().names.get(index).cloned()
    }

    /// Number of allocated ids.
    pub fn len(&self) -> usize {
        self.table().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

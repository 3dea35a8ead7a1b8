//! Insertion-ordered symbol table.
//!
//! Names are unique for the lifetime of a table; there is no overwrite
//! and no removal. Only the pipeline holds a mutable reference.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    entries: IndexMap<String, Value>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Inserts a new binding. Returns the value back if `name` is taken.
    pub(crate) fn insert(&mut self, name: String, value: Value) -> Result<(), Value> {
        match self.entries.entry(name) {
            Entry::Occupied(_) => Err(value),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }
}

//! String interning
//!
//! Attribute names and values are stored once per run in lookup tables and
//! referenced by integer id everywhere else. Ids are handed out sequentially
//! from 1, so the same text always maps to the same id within a run.
//!
//! Tables can be rolled back to an earlier mark. The per-record transaction
//! strategy uses this so that a rolled-back record does not leave ids behind
//! whose lookup rows never reached the store.

use std::collections::HashMap;

/// Result of interning a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interned {
    pub id: u64,
    /// First time this text was seen; its lookup row still has to be written
    pub fresh: bool,
}

/// One text-to-id lookup table
#[derive(Debug, Default)]
pub struct InternTable {
    ids: HashMap<String, u64>,
    order: Vec<String>,
}

impl InternTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, text: &str) -> Interned {
        if let Some(&id) = self.ids.get(text) {
            return Interned { id, fresh: false };
        }
        self.order.push(text.to_string());
        let id = self.order.len() as u64;
        self.ids.insert(text.to_string(), id);
        Interned { id, fresh: true }
    }

    pub fn get(&self, text: &str) -> Option<u64> {
        self.ids.get(text).copied()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.ids.contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position to roll back to
    pub fn mark(&self) -> usize {
        self.order.len()
    }

    /// Forget everything interned after `mark`
    pub fn rollback(&mut self, mark: usize) {
        for text in self.order.drain(mark.min(self.order.len())..) {
            self.ids.remove(&text);
        }
    }
}

/// The two lookup tables of a run: attribute names and attribute values
#[derive(Debug, Default)]
pub struct Interner {
    pub names: InternTable,
    pub values: InternTable,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }
}

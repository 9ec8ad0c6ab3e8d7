//! Per-run parser context
//!
//! Everything a run remembers across records lives in one [`ParserContext`]:
//! the configuration, the interning tables, the natural keys of shared
//! cross-reference rows and the identifiers already emitted. It is threaded
//! by `&mut` through the emitter and the transaction controller.

use serde::Serialize;

use crate::config::NormalizerConfig;
use crate::interner::{InternTable, Interner};

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub records: u64,
    pub committed: u64,
    pub failed: u64,
    pub filtered: u64,
}

/// State to return to when a record is rolled back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    names: usize,
    values: usize,
    shared: usize,
    entities: usize,
}

pub struct ParserContext<'c> {
    config: &'c NormalizerConfig,
    pub interner: Interner,
    /// Natural keys of shared cross-reference rows
    pub shared: InternTable,
    entities: InternTable,
    pub stats: RunStats,
}

impl<'c> ParserContext<'c> {
    pub fn new(config: &'c NormalizerConfig) -> Self {
        Self {
            config,
            interner: Interner::new(),
            shared: InternTable::new(),
            entities: InternTable::new(),
            stats: RunStats::default(),
        }
    }

    pub fn config(&self) -> &'c NormalizerConfig {
        self.config
    }

    pub fn is_emitted(&self, id: &str) -> bool {
        self.entities.contains(id)
    }

    pub fn mark_emitted(&mut self, id: &str) {
        self.entities.intern(id);
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            names: self.interner.names.mark(),
            values: self.interner.values.mark(),
            shared: self.shared.mark(),
            entities: self.entities.mark(),
        }
    }

    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.interner.names.rollback(checkpoint.names);
        self.interner.values.rollback(checkpoint.values);
        self.shared.rollback(checkpoint.shared);
        self.entities.rollback(checkpoint.entities);
    }
}

//! Normalizer configuration
//!
//! One [`NormalizerConfig`] is built at startup (from the CLI, see `main.rs`)
//! and passed by reference to every stage of a run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the run writes to its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Relational statements (the normal output)
    #[default]
    Sql,
    /// One JSON document per accumulated record; can be read back
    Json,
    /// Pretty `Debug` rendering of each accumulated record
    Debug,
}

/// How record emission is grouped into transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// One transaction for the whole run
    #[default]
    Batched,
    /// One transaction per record; failed records are rolled back and skipped
    PerRecord,
}

impl TransactionMode {
    pub fn from_flag(per_record: bool) -> Self {
        if per_record {
            TransactionMode::PerRecord
        } else {
            TransactionMode::Batched
        }
    }
}

/// Organism mnemonics (the `_HUMAN` in `ADH1A_HUMAN`) to keep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganismFilter {
    mnemonics: BTreeSet<String>,
}

impl OrganismFilter {
    /// Parse a comma-separated list such as `HUMAN,MOUSE`
    ///
    /// Returns `None` when the list holds no mnemonic at all.
    pub fn parse(list: &str) -> Option<Self> {
        let mnemonics: BTreeSet<String> = list
            .split(',')
            .map(|m| m.trim().trim_start_matches('_').to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .collect();

        if mnemonics.is_empty() {
            None
        } else {
            Some(Self { mnemonics })
        }
    }

    /// Whether an entry name like `ADH1A_HUMAN` belongs to a kept organism
    pub fn matches_entry_name(&self, entry_name: &str) -> bool {
        entry_name
            .rsplit_once('_')
            .map(|(_, suffix)| self.mnemonics.contains(&suffix.to_ascii_uppercase()))
            .unwrap_or(false)
    }
}

/// Settings for one normalizer run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub output_format: OutputFormat,

    /// Emit `CREATE TABLE` statements before any rows
    pub emit_schema: bool,

    pub transaction_mode: TransactionMode,

    /// Restricts protein cross-references (enzyme grammar only)
    pub organism_filter: Option<OrganismFilter>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Sql,
            emit_schema: true,
            transaction_mode: TransactionMode::Batched,
            organism_filter: None,
        }
    }
}

impl NormalizerConfig {
    pub fn builder() -> NormalizerConfigBuilder {
        NormalizerConfigBuilder::default()
    }
}

/// Builder for NormalizerConfig
#[derive(Default)]
pub struct NormalizerConfigBuilder {
    config: NormalizerConfig,
}

impl NormalizerConfigBuilder {
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn emit_schema(mut self, emit: bool) -> Self {
        self.config.emit_schema = emit;
        self
    }

    pub fn transaction_mode(mut self, mode: TransactionMode) -> Self {
        self.config.transaction_mode = mode;
        self
    }

    pub fn organism_filter(mut self, filter: Option<OrganismFilter>) -> Self {
        self.config.organism_filter = filter;
        self
    }

    pub fn build(self) -> NormalizerConfig {
        self.config
    }
}

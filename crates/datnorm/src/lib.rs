//! datnorm: flat-file database normalizer
//!
//! Reads line-oriented biological database records (UniProtKB protein
//! entries, ENZYME nomenclature entries) and emits a normalized relational
//! representation: deduplicated lookup strings, entity rows, attribute rows
//! and shared cross-reference tables, ready for bulk load.
//!
//! Data flows one way:
//!
//! ```text
//! lines -> line::classify -> accumulator::Records -> emitter::Emitter
//!       -> transaction::TransactionController -> sink::StatementSink
//! ```
//!
//! # Example
//!
//! ```no_run
//! use datnorm::config::NormalizerConfig;
//! use datnorm::grammar::EnzymeGrammar;
//! use datnorm::sink::SqlTextSink;
//! use datnorm_common::stream::{InputSource, LineStream};
//!
//! fn main() -> anyhow::Result<()> {
//!     let lines = LineStream::open(&[InputSource::parse("enzyme.dat")])?;
//!     let mut sink = SqlTextSink::new(std::io::stdout().lock());
//!     let stats = datnorm::normalize(EnzymeGrammar, lines, &NormalizerConfig::default(), &mut sink)?;
//!     eprintln!("{} records", stats.committed);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod accumulator;
pub mod cli;
pub mod config;
pub mod context;
pub mod driver;
pub mod emitter;
pub mod error;
pub mod grammar;
pub mod interner;
pub mod line;
pub mod record;
pub mod schema;
pub mod sink;
pub mod stanza;
pub mod statement;
pub mod tokens;
pub mod transaction;

pub use config::{NormalizerConfig, OrganismFilter, OutputFormat, TransactionMode};
pub use context::RunStats;
pub use driver::{dump, normalize};
pub use error::{NormalizeError, Result};
pub use record::Record;

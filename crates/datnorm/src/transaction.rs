//! Transaction control
//!
//! Two strategies decide how record emission is grouped into units of work:
//!
//! - [`PerRecord`]: `BEGIN`/`COMMIT` around every record. A record that
//!   cannot be emitted, or whose statements the store rejects, is rolled
//!   back and replaced by a placeholder comment; the run goes on.
//! - [`Batched`]: one `BEGIN` at the start of the run and one `COMMIT` at
//!   the end. The first failing record aborts the run; since no `COMMIT`
//!   was written, nothing of the batch takes effect. A repeated primary
//!   identifier is the exception: the later record is skipped with a
//!   placeholder in both strategies.
//!
//! The strategy is picked once from [`TransactionMode`] and injected into
//! the [`TransactionController`].

use tracing::{error, warn};

use crate::config::TransactionMode;
use crate::context::{Checkpoint, ParserContext};
use crate::emitter::Emitter;
use crate::error::{EmitError, NormalizeError, Result, SinkError};
use crate::record::Record;
use crate::sink::StatementSink;
use crate::statement::Statement;

/// What became of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Committed,
    /// Rolled back; a placeholder stands in its place
    Failed,
    /// Skipped by the organism filter
    Filtered,
}

pub trait TransactionStrategy {
    fn begin_run(&mut self, sink: &mut dyn StatementSink) -> Result<()>;

    fn process(
        &mut self,
        emitter: &Emitter,
        ctx: &mut ParserContext<'_>,
        record: &Record,
        sink: &mut dyn StatementSink,
    ) -> Result<RecordOutcome>;

    fn end_run(&mut self, sink: &mut dyn StatementSink) -> Result<()>;
}

/// One transaction per record
#[derive(Debug, Default)]
pub struct PerRecord;

impl PerRecord {
    fn fail(
        ctx: &mut ParserContext<'_>,
        checkpoint: Checkpoint,
        record: &Record,
        reason: &str,
        sink: &mut dyn StatementSink,
    ) -> Result<RecordOutcome> {
        ctx.rollback(checkpoint);
        warn!(record = %record.label(), reason = %reason, "record rolled back");
        sink.write(&Statement::failed_record(record.label(), reason))?;
        Ok(RecordOutcome::Failed)
    }
}

impl TransactionStrategy for PerRecord {
    fn begin_run(&mut self, _sink: &mut dyn StatementSink) -> Result<()> {
        Ok(())
    }

    fn process(
        &mut self,
        emitter: &Emitter,
        ctx: &mut ParserContext<'_>,
        record: &Record,
        sink: &mut dyn StatementSink,
    ) -> Result<RecordOutcome> {
        let checkpoint = ctx.checkpoint();

        let statements = match emitter.emit(ctx, record) {
            Ok(Some(statements)) => statements,
            Ok(None) => {
                ctx.rollback(checkpoint);
                return Ok(RecordOutcome::Filtered);
            },
            Err(e) => return Self::fail(ctx, checkpoint, record, &e.to_string(), sink),
        };

        let written = std::iter::once(&Statement::Begin)
            .chain(statements.iter())
            .chain(std::iter::once(&Statement::Commit))
            .try_for_each(|statement| sink.write(statement));

        match written {
            Ok(()) => Ok(RecordOutcome::Committed),
            Err(SinkError::Rejected { reason }) => {
                sink.write(&Statement::Rollback)?;
                Self::fail(ctx, checkpoint, record, &reason, sink)
            },
            Err(e) => Err(e.into()),
        }
    }

    fn end_run(&mut self, _sink: &mut dyn StatementSink) -> Result<()> {
        Ok(())
    }
}

/// One transaction for the whole run
#[derive(Debug, Default)]
pub struct Batched {
    open: bool,
}

impl TransactionStrategy for Batched {
    fn begin_run(&mut self, sink: &mut dyn StatementSink) -> Result<()> {
        sink.write(&Statement::Begin)?;
        self.open = true;
        Ok(())
    }

    fn process(
        &mut self,
        emitter: &Emitter,
        ctx: &mut ParserContext<'_>,
        record: &Record,
        sink: &mut dyn StatementSink,
    ) -> Result<RecordOutcome> {
        let statements = match emitter.emit(ctx, record) {
            Ok(Some(statements)) => statements,
            Ok(None) => return Ok(RecordOutcome::Filtered),
            Err(duplicate @ EmitError::DuplicateIdentifier(_)) => {
                // nothing was interned yet, the first record's rows stand
                let reason = duplicate.to_string();
                warn!(record = %record.label(), reason = %reason, "skipping repeated record");
                sink.write(&Statement::failed_record(record.label(), &reason))?;
                return Ok(RecordOutcome::Failed);
            },
            Err(source) => {
                error!(record = %record.label(), error = %source, "aborting batch");
                return Err(NormalizeError::Emit {
                    record: record.label().to_string(),
                    source,
                });
            },
        };

        for statement in &statements {
            sink.write(statement)?;
        }
        Ok(RecordOutcome::Committed)
    }

    fn end_run(&mut self, sink: &mut dyn StatementSink) -> Result<()> {
        if self.open {
            sink.write(&Statement::Commit)?;
            self.open = false;
        }
        Ok(())
    }
}

/// Runs records through the configured strategy and keeps the counters
pub struct TransactionController {
    strategy: Box<dyn TransactionStrategy>,
}

impl TransactionController {
    pub fn new(mode: TransactionMode) -> Self {
        let strategy: Box<dyn TransactionStrategy> = match mode {
            TransactionMode::PerRecord => Box::new(PerRecord),
            TransactionMode::Batched => Box::<Batched>::default(),
        };
        Self::with_strategy(strategy)
    }

    pub fn with_strategy(strategy: Box<dyn TransactionStrategy>) -> Self {
        Self { strategy }
    }

    pub fn begin_run(&mut self, sink: &mut dyn StatementSink) -> Result<()> {
        self.strategy.begin_run(sink)
    }

    pub fn process(
        &mut self,
        emitter: &Emitter,
        ctx: &mut ParserContext<'_>,
        record: &Record,
        sink: &mut dyn StatementSink,
    ) -> Result<RecordOutcome> {
        ctx.stats.records += 1;
        let outcome = self.strategy.process(emitter, ctx, record, sink)?;
        match outcome {
            RecordOutcome::Committed => ctx.stats.committed += 1,
            RecordOutcome::Failed => ctx.stats.failed += 1,
            RecordOutcome::Filtered => ctx.stats.filtered += 1,
        }
        Ok(outcome)
    }

    pub fn end_run(&mut self, sink: &mut dyn StatementSink) -> Result<()> {
        self.strategy.end_run(sink)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;
    use crate::grammar::uniprot;
    use crate::sink::MemorySink;

    fn record(id: Option<&str>) -> Record {
        Record {
            id: id.map(str::to_string),
            ..Record::default()
        }
    }

    #[test]
    fn test_per_record_wraps_each_record() {
        let config = NormalizerConfig::default();
        let mut ctx = ParserContext::new(&config);
        let emitter = Emitter::new(&uniprot::SCHEMA);
        let mut sink = MemorySink::new();
        let mut controller = TransactionController::new(TransactionMode::PerRecord);

        controller.begin_run(&mut sink).unwrap();
        controller.process(&emitter, &mut ctx, &record(Some("A")), &mut sink).unwrap();
        let outcome = controller.process(&emitter, &mut ctx, &record(None), &mut sink).unwrap();
        controller.process(&emitter, &mut ctx, &record(Some("B")), &mut sink).unwrap();
        controller.end_run(&mut sink).unwrap();

        assert_eq!(outcome, RecordOutcome::Failed);
        assert_eq!(sink.statements.iter().filter(|s| **s == Statement::Begin).count(), 2);
        assert_eq!(sink.statements.iter().filter(|s| **s == Statement::Commit).count(), 2);
        assert!(sink.to_sql().contains("-- failed record none found: record has no primary identifier"));
        assert_eq!(ctx.stats.committed, 2);
        assert_eq!(ctx.stats.failed, 1);
    }

    #[test]
    fn test_batched_aborts_without_commit() {
        let config = NormalizerConfig::default();
        let mut ctx = ParserContext::new(&config);
        let emitter = Emitter::new(&uniprot::SCHEMA);
        let mut sink = MemorySink::new();
        let mut controller = TransactionController::new(TransactionMode::Batched);

        controller.begin_run(&mut sink).unwrap();
        controller.process(&emitter, &mut ctx, &record(Some("A")), &mut sink).unwrap();
        let err = controller
            .process(&emitter, &mut ctx, &record(None), &mut sink)
            .unwrap_err();

        assert!(matches!(err, NormalizeError::Emit { .. }));
        assert_eq!(sink.statements.first(), Some(&Statement::Begin));
        assert!(!sink.statements.contains(&Statement::Commit));
    }

    #[test]
    fn test_batched_skips_repeated_identifier() {
        let config = NormalizerConfig::default();
        let mut ctx = ParserContext::new(&config);
        let emitter = Emitter::new(&uniprot::SCHEMA);
        let mut sink = MemorySink::new();
        let mut controller = TransactionController::new(TransactionMode::Batched);

        controller.begin_run(&mut sink).unwrap();
        controller.process(&emitter, &mut ctx, &record(Some("A")), &mut sink).unwrap();
        let outcome = controller.process(&emitter, &mut ctx, &record(Some("A")), &mut sink).unwrap();
        controller.process(&emitter, &mut ctx, &record(Some("B")), &mut sink).unwrap();
        controller.end_run(&mut sink).unwrap();

        assert_eq!(outcome, RecordOutcome::Failed);
        assert_eq!(ctx.stats.committed, 2);
        assert_eq!(ctx.stats.failed, 1);
        assert!(sink.to_sql().contains("-- failed record A: primary identifier A was already emitted"));
        assert_eq!(sink.statements.last(), Some(&Statement::Commit));
    }
}

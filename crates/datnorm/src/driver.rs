//! Run orchestration
//!
//! [`normalize`] sequences one run: schema statements, then every record
//! through the transaction controller, then the closing statements. [`dump`]
//! is the debugging path that prints accumulated records instead.

use std::io::Write;
use tracing::{debug, info};

use crate::accumulator::Records;
use crate::config::{NormalizerConfig, OutputFormat};
use crate::context::{ParserContext, RunStats};
use crate::emitter::Emitter;
use crate::error::{NormalizeError, Result};
use crate::grammar::Grammar;
use crate::sink::StatementSink;
use crate::statement::Statement;
use crate::transaction::TransactionController;

/// Normalize every record of `lines` into `sink`
///
/// Stops at the first fatal error. Everything written to the sink before
/// that point stays valid.
pub fn normalize<G, L, E>(
    grammar: G,
    lines: L,
    config: &NormalizerConfig,
    sink: &mut dyn StatementSink,
) -> Result<RunStats>
where
    G: Grammar,
    L: Iterator<Item = std::result::Result<String, E>>,
    E: Into<NormalizeError>,
{
    let name = grammar.name();
    let emitter = Emitter::new(grammar.schema());
    let mut ctx = ParserContext::new(config);
    let mut controller = TransactionController::new(config.transaction_mode);

    info!(
        grammar = name,
        mode = ?config.transaction_mode,
        filter = ?config.organism_filter,
        "Starting normalization"
    );

    if config.emit_schema {
        for ddl in emitter.schema().ddl() {
            sink.write(&Statement::Ddl(ddl))?;
        }
    }

    controller.begin_run(sink)?;
    for record in Records::new(grammar, lines) {
        let record = record?;
        let outcome = controller.process(&emitter, &mut ctx, &record, sink)?;
        debug!(record = %record.label(), outcome = ?outcome, "record processed");
    }
    controller.end_run(sink)?;
    sink.finish()?;

    let stats = ctx.stats;
    info!(
        grammar = name,
        records = stats.records,
        committed = stats.committed,
        failed = stats.failed,
        filtered = stats.filtered,
        "Normalization complete"
    );
    Ok(stats)
}

/// Print accumulated records as JSON lines or `Debug` output
///
/// Nothing is interned, filtered or emitted; `stats.records` counts what was
/// printed.
pub fn dump<G, L, E>(grammar: G, lines: L, format: OutputFormat, out: &mut dyn Write) -> Result<RunStats>
where
    G: Grammar,
    L: Iterator<Item = std::result::Result<String, E>>,
    E: Into<NormalizeError>,
{
    let mut stats = RunStats::default();
    for record in Records::new(grammar, lines) {
        let record = record?;
        match format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, &record)?;
                writeln!(out)?;
            },
            OutputFormat::Debug | OutputFormat::Sql => writeln!(out, "{record:#?}")?,
        }
        stats.records += 1;
    }
    out.flush()?;
    info!(records = stats.records, "Dump complete");
    Ok(stats)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::grammar::EnzymeGrammar;
    use crate::record::Record;
    use crate::sink::MemorySink;
    use std::convert::Infallible;

    fn lines(text: &str) -> impl Iterator<Item = std::result::Result<String, Infallible>> + '_ {
        text.lines().map(|l| Ok(l.to_string()))
    }

    #[test]
    fn test_schema_can_be_omitted() {
        let config = NormalizerConfig::builder().emit_schema(false).build();
        let mut sink = MemorySink::new();
        normalize(EnzymeGrammar, lines("ID   1.1.1.1\n//\n"), &config, &mut sink).unwrap();

        assert!(!sink.to_sql().contains("CREATE TABLE"));
        assert_eq!(sink.statements.first(), Some(&Statement::Begin));
        assert_eq!(sink.statements.last(), Some(&Statement::Commit));
    }

    #[test]
    fn test_json_dump_reads_back() {
        let mut out = Vec::new();
        let stats = dump(
            EnzymeGrammar,
            lines("ID   1.1.1.1\nDE   Alcohol dehydrogenase.\n//\nID   1.1.1.2\n//\n"),
            OutputFormat::Json,
            &mut out,
        )
        .unwrap();
        assert_eq!(stats.records, 2);

        let text = String::from_utf8(out).unwrap();
        let records: Vec<Record> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records[0].scalars["description"], "Alcohol dehydrogenase");
        assert_eq!(records[1].id.as_deref(), Some("1.1.1.2"));
    }
}

//! Transaction strategy behaviour against a store that rejects statements

mod common;

use common::{column, committed, entry_id, lines};
use datnorm::error::{NormalizeError, SinkError};
use datnorm::grammar::UniProtGrammar;
use datnorm::sink::{MemorySink, StatementSink};
use datnorm::statement::{SqlValue, Statement};
use datnorm::{normalize, NormalizerConfig, TransactionMode};

/// Accepts everything except list attributes of one entry, like a store
/// with a failing constraint would
struct RejectingSink {
    inner: MemorySink,
    reject_entry: &'static str,
}

impl StatementSink for RejectingSink {
    fn write(&mut self, statement: &Statement) -> Result<(), SinkError> {
        if let Statement::Insert(insert) = statement {
            if insert.table == "protein_list_attributes" && entry_id(insert) == Some(self.reject_entry) {
                return Err(SinkError::Rejected {
                    reason: "check constraint violated".to_string(),
                });
            }
        }
        self.inner.write(statement)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.inner.finish()
    }
}

const THREE_ENTRIES: &str = "\
ID   FIRST_HUMAN             Reviewed;          10 AA.
AC   P11111;
KW   Alpha.
//
ID   BROKEN_HUMAN            Reviewed;          10 AA.
AC   P22222;
OS   Homo sapiens (Human).
KW   Shared; Beta.
//
ID   THIRD_HUMAN             Reviewed;          10 AA.
AC   P33333;
KW   Shared.
//
";

fn rejecting_run(mode: TransactionMode) -> (datnorm::Result<datnorm::RunStats>, RejectingSink) {
    let config = NormalizerConfig::builder().transaction_mode(mode).build();
    let mut sink = RejectingSink {
        inner: MemorySink::new(),
        reject_entry: "BROKEN_HUMAN",
    };
    let result = normalize(UniProtGrammar, lines(THREE_ENTRIES), &config, &mut sink);
    (result, sink)
}

#[test]
fn test_per_record_rolls_back_only_the_failing_record() {
    let (result, sink) = rejecting_run(TransactionMode::PerRecord);
    let stats = result.expect("per-record run should survive a rejected record");
    assert_eq!((stats.committed, stats.failed), (2, 1));

    let rows = committed(&sink.inner.statements);
    assert!(rows.iter().all(|r| entry_id(r) != Some("BROKEN_HUMAN")));
    assert!(rows.iter().any(|r| entry_id(r) == Some("FIRST_HUMAN")));
    assert!(rows.iter().any(|r| entry_id(r) == Some("THIRD_HUMAN")));

    let sql = sink.inner.to_sql();
    assert!(sql.contains("ROLLBACK;"));
    assert!(sql.contains("-- failed record BROKEN_HUMAN: check constraint violated"));
}

#[test]
fn test_values_interned_by_a_rolled_back_record_are_written_again() {
    let (result, sink) = rejecting_run(TransactionMode::PerRecord);
    result.expect("per-record run should survive a rejected record");

    let rows = committed(&sink.inner.statements);
    let shared = rows
        .iter()
        .find(|r| r.table == "attribute_values" && column(r, "value") == Some(&SqlValue::text("Shared")))
        .expect("lookup row for 'Shared' must survive the rollback");
    let shared_id = column(shared, "id").cloned();

    let third_keyword = rows
        .iter()
        .find(|r| r.table == "protein_list_attributes" && entry_id(r) == Some("THIRD_HUMAN"))
        .expect("THIRD_HUMAN keyword row");
    assert_eq!(column(third_keyword, "value_id").cloned(), shared_id);

    // every referenced value id has a committed lookup row
    let known: Vec<_> = rows
        .iter()
        .filter(|r| r.table == "attribute_values")
        .filter_map(|r| column(r, "id").cloned())
        .collect();
    for row in rows.iter().filter(|r| r.table == "protein_list_attributes") {
        let value_id = column(row, "value_id").cloned().expect("value_id");
        assert!(known.contains(&value_id));
    }
}

#[test]
fn test_batched_run_aborts_on_rejection() {
    let (result, sink) = rejecting_run(TransactionMode::Batched);

    assert!(matches!(
        result,
        Err(NormalizeError::Sink(SinkError::Rejected { .. }))
    ));
    assert!(!sink.inner.statements.contains(&Statement::Commit));
    assert!(committed(&sink.inner.statements).is_empty());
    assert!(!sink.inner.to_sql().contains("THIRD_HUMAN"));
}

#[test]
fn test_missing_identifier_placeholder() {
    let config = NormalizerConfig::builder()
        .transaction_mode(TransactionMode::PerRecord)
        .build();
    let mut sink = MemorySink::new();
    let stats = normalize(UniProtGrammar, lines("ID\nAC   P1;\n//\nID   OK_HUMAN\n//\n"), &config, &mut sink)
        .expect("Failed to normalize");

    assert_eq!(stats.failed, 1);
    assert!(sink
        .to_sql()
        .contains("-- failed record none found: record has no primary identifier"));
    assert_eq!(committed(&sink.statements).len(), 1);
}

#[test]
fn test_duplicate_identifier_first_wins() {
    let config = NormalizerConfig::builder()
        .transaction_mode(TransactionMode::PerRecord)
        .build();
    let mut sink = MemorySink::new();
    let text = "ID   DUP_HUMAN\nKW   First.\n//\nID   DUP_HUMAN\nKW   Second.\n//\n";
    normalize(UniProtGrammar, lines(text), &config, &mut sink).expect("Failed to normalize");

    let sql = sink.to_sql();
    assert!(sql.contains("'First'"));
    assert!(!sql.contains("'Second'"));
    assert!(sql.contains("-- failed record DUP_HUMAN: primary identifier DUP_HUMAN was already emitted"));
}

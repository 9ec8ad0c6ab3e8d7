//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::convert::Infallible;
use std::path::PathBuf;

use datnorm::statement::{Insert, SqlValue, Statement};

pub fn fixture_path(format: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format)
        .join("sample.dat")
}

pub fn fixture_text(format: &str) -> String {
    std::fs::read_to_string(fixture_path(format)).expect("Failed to read fixture")
}

/// In-memory line source
pub fn lines(text: &str) -> impl Iterator<Item = Result<String, Infallible>> + '_ {
    text.lines().map(|l| Ok(l.to_string()))
}

pub fn inserts<'a>(statements: &'a [Statement], table: &str) -> Vec<&'a Insert> {
    statements
        .iter()
        .filter_map(|s| match s {
            Statement::Insert(insert) if insert.table == table => Some(insert),
            _ => None,
        })
        .collect()
}

/// Inserts that survive transaction semantics: statements between BEGIN and
/// ROLLBACK are discarded, as are statements of a transaction never committed
pub fn committed(statements: &[Statement]) -> Vec<Insert> {
    let mut out = Vec::new();
    let mut pending = Vec::new();
    let mut open = false;

    for statement in statements {
        match statement {
            Statement::Begin => open = true,
            Statement::Commit => {
                out.append(&mut pending);
                open = false;
            },
            Statement::Rollback => {
                pending.clear();
                open = false;
            },
            Statement::Insert(insert) if open => pending.push(insert.clone()),
            Statement::Insert(insert) => out.push(insert.clone()),
            _ => {},
        }
    }
    out
}

/// Value of `column` in an insert
pub fn column<'a>(insert: &'a Insert, column: &str) -> Option<&'a SqlValue> {
    insert
        .columns
        .iter()
        .position(|c| *c == column)
        .map(|i| &insert.values[i])
}

pub fn entry_id(insert: &Insert) -> Option<&str> {
    match column(insert, "entry_id").or_else(|| column(insert, "id")) {
        Some(SqlValue::Text(id)) => Some(id.as_str()),
        _ => None,
    }
}

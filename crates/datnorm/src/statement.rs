//! Relational statements
//!
//! The emitter produces [`Statement`] values rather than text so that the
//! transaction controller can wrap them and different sinks can execute or
//! print them. Rendering produces SQL accepted by both PostgreSQL and SQLite.

use std::fmt;

/// A literal in an insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::Text(value.into())
    }

    pub fn id(id: u64) -> Self {
        SqlValue::Integer(id as i64)
    }
}

impl From<Option<u64>> for SqlValue {
    fn from(value: Option<u64>) -> Self {
        value.map(SqlValue::id).unwrap_or(SqlValue::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Integer(n) => write!(f, "{n}"),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// Single-row insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<&'static str>,
    pub values: Vec<SqlValue>,
    /// Render `ON CONFLICT DO NOTHING`
    pub ignore_conflicts: bool,
}

impl Insert {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
            ignore_conflicts: false,
        }
    }

    pub fn value(mut self, column: &'static str, value: SqlValue) -> Self {
        self.columns.push(column);
        self.values.push(value);
        self
    }

    pub fn ignore_conflicts(mut self) -> Self {
        self.ignore_conflicts = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Begin,
    Commit,
    Rollback,
    /// Schema definition, rendered verbatim
    Ddl(String),
    Insert(Insert),
    /// Non-executable note in the output stream
    Comment(String),
}

impl Statement {
    /// Placeholder left in the output where a record was rolled back
    pub fn failed_record(label: &str, reason: &str) -> Self {
        Statement::Comment(format!("failed record {label}: {reason}"))
    }
}

impl From<Insert> for Statement {
    fn from(insert: Insert) -> Self {
        Statement::Insert(insert)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Begin => f.write_str("BEGIN;"),
            Statement::Commit => f.write_str("COMMIT;"),
            Statement::Rollback => f.write_str("ROLLBACK;"),
            Statement::Ddl(sql) => write!(f, "{sql};"),
            Statement::Comment(text) => {
                // keep the comment on one line
                write!(f, "-- {}", text.replace(['\r', '\n'], " "))
            },
            Statement::Insert(insert) => {
                let values = insert
                    .values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "INSERT INTO {} ({}) VALUES ({})",
                    insert.table,
                    insert.columns.join(", "),
                    values
                )?;
                if insert.ignore_conflicts {
                    f.write_str(" ON CONFLICT DO NOTHING")?;
                }
                f.write_str(";")
            },
        }
    }
}

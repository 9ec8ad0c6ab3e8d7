//! Statement sinks
//!
//! A sink receives statements strictly in emission order. [`SqlTextSink`]
//! renders them as SQL text; [`MemorySink`] keeps them for inspection; with
//! the `database` feature, `PgSink` executes them against PostgreSQL.

use std::io::Write;

use crate::error::SinkError;
use crate::statement::Statement;

pub trait StatementSink {
    fn write(&mut self, statement: &Statement) -> Result<(), SinkError>;

    /// Flush buffered output at the end of a run
    fn finish(&mut self) -> Result<(), SinkError>;
}

/// Writes one statement per line
pub struct SqlTextSink<W: Write> {
    out: W,
}

impl<W: Write> SqlTextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatementSink for SqlTextSink<W> {
    fn write(&mut self, statement: &Statement) -> Result<(), SinkError> {
        writeln!(self.out, "{statement}")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Collects statements in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub statements: Vec<Statement>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered SQL, one statement per line
    pub fn to_sql(&self) -> String {
        self.statements
            .iter()
            .map(|s| format!("{s}\n"))
            .collect()
    }
}

impl StatementSink for MemorySink {
    fn write(&mut self, statement: &Statement) -> Result<(), SinkError> {
        self.statements.push(statement.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(feature = "database")]
pub use postgres::PgSink;

#[cfg(feature = "database")]
mod postgres {
    use sqlx::{Connection, PgConnection};
    use tokio::runtime::{Builder, Runtime};
    use tracing::{info, warn};

    use super::StatementSink;
    use crate::error::SinkError;
    use crate::statement::Statement;

    /// Executes statements on a live PostgreSQL connection
    ///
    /// The normalizer itself is synchronous, so the sink owns a
    /// current-thread runtime and blocks on each statement.
    pub struct PgSink {
        runtime: Runtime,
        conn: PgConnection,
    }

    impl PgSink {
        pub fn connect(url: &str) -> Result<Self, SinkError> {
            let runtime = Builder::new_current_thread().enable_all().build()?;
            let conn = runtime
                .block_on(PgConnection::connect(url))
                .map_err(|e| SinkError::Io(std::io::Error::other(e)))?;
            info!("Connected to database");
            Ok(Self { runtime, conn })
        }
    }

    impl StatementSink for PgSink {
        fn write(&mut self, statement: &Statement) -> Result<(), SinkError> {
            if let Statement::Comment(text) = statement {
                warn!("{text}");
                return Ok(());
            }

            let sql = statement.to_string();
            let result = self
                .runtime
                .block_on(sqlx::raw_sql(&sql).execute(&mut self.conn));

            match result {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(e)) => Err(SinkError::Rejected {
                    reason: e.message().to_string(),
                }),
                Err(e) => Err(SinkError::Io(std::io::Error::other(e))),
            }
        }

        fn finish(&mut self) -> Result<(), SinkError> {
            Ok(())
        }
    }
}

//! Database gateway capability.
//!
//! The reconciliation core only talks to the database through [`Gateway`].
//! Adapters normalise their driver's result shape into [`QueryOutput`], so the
//! callers never need to know whether rows arrive directly or nested.

pub mod sqlite;
#[cfg(test)]
pub(crate) mod testing;

use tracing::debug;

use crate::config::DbConfig;
use crate::error::{AssistError, Result};
use crate::model::{Column, Record, Row, Table, Value};
use crate::sql::{Dialect, SqlBuilder, Statement};

pub use sqlite::SqliteGateway;

/// Result of running one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub rows: Vec<Row>,
    pub affected: usize,
}

/// What [`Gateway::save`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
    /// The row exists but the record carries nothing to update.
    Unchanged,
}

/// Uniform access to one database connection.
///
/// The connection is owned by a single import or export call and used strictly
/// sequentially.
pub trait Gateway {
    /// Dialect tag selecting placeholder syntax and limit-query shape.
    fn dialect(&self) -> Dialect;

    /// Runs `sql` with positional `args`.
    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<QueryOutput>;

    /// Columns of `table` in declared order.
    fn columns(&mut self, table: &str) -> Result<Vec<Column>>;

    /// Tables sorted by name.
    fn tables(&mut self) -> Result<Vec<Table>>;

    /// Makes everything executed so far durable.
    fn commit(&mut self) -> Result<()>;

    /// Up to `limit` rows of `table`, optionally filtered by a raw `WHERE`
    /// condition.
    fn select(&mut self, table: &str, limit: usize, filter: Option<&str>) -> Result<Vec<Row>> {
        let sql = self.dialect().limit_query(table, limit, filter);
        Ok(self.execute(&sql, &[])?.rows)
    }

    /// Whether a row matching the record's keys is already stored. An
    /// undecidable check counts as "does not exist".
    fn exists(&mut self, table: &str, columns: &[Column], record: &Record) -> Result<bool> {
        let builder = SqlBuilder::new(self.dialect());
        let Some(statement) = builder.exists(table, columns, record) else {
            return Ok(false);
        };
        let output = run(self, &statement)?;
        let total = output
            .rows
            .first()
            .and_then(Row::first)
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(total > 0)
    }

    /// Updates the record's row when it exists, inserts it otherwise.
    fn save(&mut self, table: &str, columns: &[Column], record: &Record) -> Result<SaveOutcome> {
        let builder = SqlBuilder::new(self.dialect());
        if self.exists(table, columns, record)? {
            match builder.update(table, columns, record) {
                Some(statement) => {
                    run(self, &statement)?;
                    Ok(SaveOutcome::Updated)
                }
                None => {
                    debug!(table, "record has nothing to update");
                    Ok(SaveOutcome::Unchanged)
                }
            }
        } else {
            run(self, &builder.insert(table, columns, record))?;
            Ok(SaveOutcome::Inserted)
        }
    }
}

fn run<G: Gateway + ?Sized>(gateway: &mut G, statement: &Statement) -> Result<QueryOutput> {
    debug!(sql = %statement.sql, args = statement.args.len(), "executing statement");
    gateway.execute(&statement.sql, &statement.args)
}

/// Opens the gateway described by `config`.
pub fn connect(config: &DbConfig) -> Result<Box<dyn Gateway>> {
    match config.dialect {
        Dialect::Sqlite => {
            let path = config.path.as_ref().ok_or_else(|| {
                AssistError::InvalidConfig("sqlite dialect requires a 'path'".into())
            })?;
            Ok(Box::new(SqliteGateway::open(path)?))
        }
        other => Err(AssistError::UnsupportedDatabase(other.to_string())),
    }
}

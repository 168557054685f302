//! SQLite adapter built on rusqlite.
//!
//! Statements run inside a transaction that is opened lazily by the first
//! `execute` and closed by [`Gateway::commit`], so one import is applied as a
//! single commit.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};
use tracing::{debug, trace};

use crate::error::{AssistError, Result};
use crate::gateway::{Gateway, QueryOutput};
use crate::model::{Column, Row, Table, Value, sort_tables};
use crate::sql::Dialect;

/// Gateway over a single SQLite connection.
pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening sqlite database");
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Underlying connection, e.g. for schema setup.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn begin_if_needed(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn pragma_rows(&self, sql: &str) -> Result<Vec<Row>> {
        Ok(run_query(&self.conn, sql, &[])?.rows)
    }

    /// Columns covered by a single-column unique index that is not the
    /// primary key.
    fn unique_columns(&self, table: &str) -> Result<HashSet<String>> {
        let mut unique = HashSet::new();
        for index in self.pragma_rows(&format!("PRAGMA index_list({})", literal(table)))? {
            let is_unique = index.get("unique").and_then(Value::as_i64) == Some(1);
            let origin = index.get("origin").map(Value::to_string).unwrap_or_default();
            if !is_unique || origin == "pk" {
                continue;
            }
            let Some(name) = index.get("name").map(Value::to_string) else {
                continue;
            };
            let members = self.pragma_rows(&format!("PRAGMA index_info({})", literal(&name)))?;
            if let [member] = members.as_slice() {
                if let Some(column) = member.get("name") {
                    unique.insert(column.to_string());
                }
            }
        }
        Ok(unique)
    }

    fn foreign_tables(&self, table: &str) -> Result<HashMap<String, String>> {
        let mut foreign = HashMap::new();
        for key in self.pragma_rows(&format!("PRAGMA foreign_key_list({})", literal(table)))? {
            if let (Some(from), Some(target)) = (key.get("from"), key.get("table")) {
                foreign.insert(from.to_string(), target.to_string());
            }
        }
        Ok(foreign)
    }
}

impl Gateway for SqliteGateway {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<QueryOutput> {
        self.begin_if_needed()?;
        run_query(&self.conn, sql, args)
    }

    fn columns(&mut self, table: &str) -> Result<Vec<Column>> {
        let info = self.pragma_rows(&format!("PRAGMA table_info({})", literal(table)))?;
        if info.is_empty() {
            return Err(AssistError::TableNotFound(table.to_string()));
        }
        let unique = self.unique_columns(table)?;
        let foreign = self.foreign_tables(table)?;
        let primary_count = info
            .iter()
            .filter(|row| row.get("pk").and_then(Value::as_i64).unwrap_or(0) > 0)
            .count();

        let columns = info
            .iter()
            .map(|row| {
                let name = row.get("name").map(Value::to_string).unwrap_or_default();
                let data_type = row.get("type").map(Value::to_string).unwrap_or_default();
                let primary = row.get("pk").and_then(Value::as_i64).unwrap_or(0) > 0;
                let not_null = row.get("notnull").and_then(Value::as_i64).unwrap_or(0) == 1;
                let foreign_table = foreign.get(&name).cloned();
                Column {
                    unique: !primary && unique.contains(&name),
                    foreign: foreign_table.is_some(),
                    foreign_table,
                    nullable: !primary && !not_null,
                    // A lone INTEGER primary key aliases the rowid.
                    auto_increment: primary
                        && primary_count == 1
                        && data_type.eq_ignore_ascii_case("INTEGER"),
                    primary,
                    data_type,
                    name,
                }
            })
            .collect();
        trace!(table, "introspected columns");
        Ok(columns)
    }

    fn tables(&mut self) -> Result<Vec<Table>> {
        let rows = self.pragma_rows(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )?;
        let tables = rows
            .iter()
            .filter_map(Row::first)
            .map(|name| Table::new(name.to_string()))
            .collect();
        Ok(sort_tables(tables))
    }

    fn commit(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }
}

/// Single-quoted SQL string literal with embedded quotes doubled.
fn literal(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

fn run_query(conn: &Connection, sql: &str, args: &[Value]) -> Result<QueryOutput> {
    let mut stmt = conn.prepare(sql)?;
    let labels: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        let affected = stmt.execute(params_from_iter(args.iter()))?;
        return Ok(QueryOutput {
            rows: Vec::new(),
            affected,
        });
    }

    let mut rows = Vec::new();
    let mut cursor = stmt.query(params_from_iter(args.iter()))?;
    while let Some(row) = cursor.next()? {
        let values = (0..labels.len())
            .map(|index| row.get_ref(index).map(from_sql))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.push(Row::new(labels.clone(), values));
    }
    Ok(QueryOutput { rows, affected: 0 })
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(value) => Value::Int(value),
        ValueRef::Real(value) => Value::Float(value),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Int(value) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*value)),
            Value::Float(value) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*value)),
            Value::Bool(value) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*value)))
            }
            Value::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
        })
    }
}

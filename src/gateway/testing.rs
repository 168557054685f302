use crate::error::{AssistError, Result};
use crate::gateway::{Gateway, QueryOutput};
use crate::model::{Column, Row, Table, Value};
use crate::sql::Dialect;

/// In-memory gateway that records every executed statement and answers
/// queries from scripted responses keyed by SQL prefix.
pub(crate) struct RecordingGateway {
    dialect: Dialect,
    responses: Vec<(String, Vec<Row>)>,
    failures: Vec<(String, String)>,
    columns: Vec<(String, Vec<Column>)>,
    executed: Vec<(String, Vec<Value>)>,
    commits: usize,
}

impl RecordingGateway {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            responses: Vec::new(),
            failures: Vec::new(),
            columns: Vec::new(),
            executed: Vec::new(),
            commits: 0,
        }
    }

    pub(crate) fn respond(&mut self, prefix: &str, rows: Vec<Row>) {
        self.responses.push((prefix.to_string(), rows));
    }

    pub(crate) fn fail(&mut self, prefix: &str, message: &str) {
        self.failures.push((prefix.to_string(), message.to_string()));
    }

    pub(crate) fn define(&mut self, table: &str, columns: Vec<Column>) {
        self.columns.push((table.to_string(), columns));
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.executed.iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub(crate) fn executed(&self) -> &[(String, Vec<Value>)] {
        &self.executed
    }

    pub(crate) fn execute_count(&self) -> usize {
        self.executed.len()
    }

    pub(crate) fn commits(&self) -> usize {
        self.commits
    }
}

impl Gateway for RecordingGateway {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<QueryOutput> {
        self.executed.push((sql.to_string(), args.to_vec()));
        if let Some((_, message)) = self.failures.iter().find(|(prefix, _)| sql.starts_with(prefix)) {
            return Err(AssistError::Io(std::io::Error::other(message.clone())));
        }
        let rows = self
            .responses
            .iter()
            .find(|(prefix, _)| sql.starts_with(prefix))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        Ok(QueryOutput { rows, affected: 1 })
    }

    fn columns(&mut self, table: &str) -> Result<Vec<Column>> {
        self.columns
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| columns.clone())
            .ok_or_else(|| AssistError::TableNotFound(table.to_string()))
    }

    fn tables(&mut self) -> Result<Vec<Table>> {
        Ok(crate::model::sort_tables(
            self.columns.iter().map(|(name, _)| Table::new(name.clone())).collect(),
        ))
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}

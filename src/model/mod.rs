use std::fmt;

use serde::{Deserialize, Serialize};

/// Describes one column of a table as reported by schema introspection.
///
/// A table has at most one auto-increment column; primary keys may span
/// several columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared type as spelled by the database, e.g. `VARCHAR2(50 CHAR)`.
    pub data_type: String,
    pub primary: bool,
    pub unique: bool,
    pub foreign: bool,
    /// Referenced table when `foreign` is set.
    pub foreign_table: Option<String>,
    pub nullable: bool,
    pub auto_increment: bool,
}

impl Column {
    /// Creates a nullable column without constraints.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary: false,
            unique: false,
            foreign: false,
            foreign_table: None,
            nullable: true,
            auto_increment: false,
        }
    }

    /// Marks the column as (part of) the primary key.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }

    /// Marks the column as auto-generated by the database.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the column as carrying a single-column unique constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the column as a foreign key into `table`.
    pub fn references(mut self, table: impl Into<String>) -> Self {
        self.foreign = true;
        self.foreign_table = Some(table.into());
        self
    }

    /// Marks the column as `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// A table known to the database.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Sorts tables by name so exports are stable between runs.
pub fn sort_tables(mut tables: Vec<Table>) -> Vec<Table> {
    tables.sort();
    tables
}

/// A scalar that can be bound as a statement parameter or read back from a
/// result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Interprets the value as an integer count, as returned by `count(*)`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Float(value) => Some(*value as i64),
            Value::Bool(value) => Some(i64::from(*value)),
            Value::Text(value) => value.trim().parse().ok(),
            Value::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/// The resolved content of one spreadsheet cell.
///
/// `Raw` fragments are spliced verbatim into the statement text and are never
/// bound. Whoever authors the workbook is trusted with that SQL: the builder
/// does not escape or validate it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Bindable scalar, possibly `NULL`.
    Param(Value),
    /// Raw SQL fragment, e.g. `sysdate` or `seq_users.nextval`.
    Raw(String),
}

impl FieldValue {
    /// Returns `true` only for a bound `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Param(Value::Null))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Param(value)
    }
}

/// Field name → resolved value mapping for one spreadsheet row, kept in the
/// order fields were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value of a field.
    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Builder-style variant of [`Record::insert`].
    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One result row with its column labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Value of the left-most column.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// Value of the column labelled `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|column| column == name)
            .and_then(|index| self.values.get(index))
    }
}

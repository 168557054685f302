use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, AssistError>;

/// Error type covering the different failure cases that can occur while a
/// workbook is reconciled against a database or a table is exported.
#[derive(Debug, Error)]
pub enum AssistError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when a JSON configuration file cannot be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Opaque failures reported by the SQLite gateway.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Raised when a workbook does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a cell holds a formula instead of a literal.
    #[error("Invalid value at {cell}: formula is not supported")]
    FormulaNotSupported { cell: String },

    /// Raised when a cell assignment tries to run `insert` or `update`.
    #[error("Invalid assignment at {cell}: {expression}")]
    UnsupportedAssignment { cell: String, expression: String },

    /// Raised when a built-in function call has the wrong shape or arity.
    #[error("Invalid custom function at {cell}: {expression}")]
    InvalidCustomFunction { cell: String, expression: String },

    /// Raised when a `select` assignment fails or yields no rows.
    #[error("SELECT command failed at {cell}: {expression} ({reason})")]
    AssignmentQueryFailed {
        cell: String,
        expression: String,
        reason: String,
    },

    /// Raised when introspection returns no columns for a table.
    #[error("Table '{0}' does not exist or has no columns")]
    TableNotFound(String),

    /// Raised when no gateway implementation exists for a dialect.
    #[error("Database type '{0}' is not supported yet")]
    UnsupportedDatabase(String),

    /// Raised when the connection settings are incomplete.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

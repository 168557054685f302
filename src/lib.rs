//! Core library for the db-assist command line application.
//!
//! The library moves tabular data between relational databases and `.xlsx`
//! workbooks. Cells are resolved by the expression evaluator in [`eval`],
//! assembled into records by [`record`], and persisted through the
//! dialect-aware upsert statements of [`sql`] via a [`gateway::Gateway`].
//! Workbook adapters live under [`io`] and the import/export orchestration in
//! [`sync`].

pub mod config;
pub mod error;
pub mod eval;
pub mod gateway;
pub mod io;
pub mod model;
pub mod record;
pub mod sheet;
pub mod sql;
pub mod sync;

pub use error::{AssistError, Result};

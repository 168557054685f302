//! Dialect-aware statement building for the per-record upsert.

pub mod builder;
pub mod dialect;

pub use builder::{SqlBuilder, Statement};
pub use dialect::Dialect;

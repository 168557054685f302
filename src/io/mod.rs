//! Spreadsheet adapters: calamine for reading, rust_xlsxwriter for writing.

pub mod excel_read;
pub mod excel_write;

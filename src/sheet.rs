//! Tabular sheet capability consumed by the record assembler.
//!
//! Rows and columns are 1-based, matching the A1 addresses reported in error
//! messages. Row [`HEADER_ROW`] carries column names, row [`METADATA_ROW`] is
//! reserved for human-readable column attributes and data starts at
//! [`FIRST_DATA_ROW`].

use std::collections::BTreeMap;

use crate::model::Value;

pub const HEADER_ROW: u32 = 1;
pub const METADATA_ROW: u32 = 2;
pub const FIRST_DATA_ROW: u32 = 3;

/// Content of a single cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    /// Formula text when the cell is computed.
    pub formula: Option<String>,
    /// Literal (or cached computed) value.
    pub value: Value,
}

impl SheetCell {
    pub fn empty() -> Self {
        Self {
            formula: None,
            value: Value::Null,
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            formula: None,
            value: value.into(),
        }
    }

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }
}

/// Read access to one worksheet.
pub trait Sheet {
    /// Worksheet name; doubles as the target table name on import.
    fn name(&self) -> &str;

    fn row_count(&self) -> u32;

    fn column_count(&self) -> u32;

    /// Returns the cell at the 1-based position, or an empty cell.
    fn cell(&self, row: u32, column: u32) -> SheetCell;
}

/// Sheet kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    name: String,
    cells: BTreeMap<(u32, u32), SheetCell>,
    rows: u32,
    columns: u32,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn set(&mut self, row: u32, column: u32, cell: SheetCell) -> &mut Self {
        self.rows = self.rows.max(row);
        self.columns = self.columns.max(column);
        self.cells.insert((row, column), cell);
        self
    }

    pub fn set_value(&mut self, row: u32, column: u32, value: impl Into<Value>) -> &mut Self {
        self.set(row, column, SheetCell::literal(value))
    }

    pub fn set_formula(&mut self, row: u32, column: u32, formula: impl Into<String>) -> &mut Self {
        self.set(
            row,
            column,
            SheetCell {
                formula: Some(formula.into()),
                value: Value::Null,
            },
        )
    }

    /// Writes `names` left to right into the header row.
    pub fn set_headers<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (index, name) in names.into_iter().enumerate() {
            self.set_value(HEADER_ROW, index as u32 + 1, Value::Text(name.into()));
        }
        self
    }
}

impl Sheet for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_count(&self) -> u32 {
        self.rows
    }

    fn column_count(&self) -> u32 {
        self.columns
    }

    fn cell(&self, row: u32, column: u32) -> SheetCell {
        self.cells
            .get(&(row, column))
            .cloned()
            .unwrap_or_else(SheetCell::empty)
    }
}

/// Formats a 1-based position as an A1 address, e.g. `(3, 28)` → `AB3`.
pub fn cell_address(row: u32, column: u32) -> String {
    let mut letters = Vec::new();
    let mut remaining = column;
    while remaining > 0 {
        let offset = ((remaining - 1) % 26) as u8;
        letters.push((b'A' + offset) as char);
        remaining = (remaining - 1) / 26;
    }
    let column: String = letters.into_iter().rev().collect();
    format!("{column}{row}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_use_bijective_base26() {
        assert_eq!(cell_address(1, 1), "A1");
        assert_eq!(cell_address(3, 26), "Z3");
        assert_eq!(cell_address(3, 27), "AA3");
        assert_eq!(cell_address(10, 28), "AB10");
        assert_eq!(cell_address(4, 703), "AAA4");
    }

    #[test]
    fn memory_sheet_tracks_extent() {
        let mut sheet = MemorySheet::new("users");
        sheet.set_headers(["id", "email"]);
        sheet.set_value(5, 3, "x");

        assert_eq!(sheet.row_count(), 5);
        assert_eq!(sheet.column_count(), 3);
        assert_eq!(sheet.cell(4, 1), SheetCell::empty());
        assert_eq!(sheet.cell(1, 2).value, Value::from("email"));
    }
}

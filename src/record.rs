//! Turns one spreadsheet row into a [`Record`].

use rand::Rng;

use crate::error::Result;
use crate::eval::Evaluator;
use crate::gateway::Gateway;
use crate::model::{Column, Record, Value};
use crate::sheet::{HEADER_ROW, Sheet, cell_address};

/// Column name → 1-based sheet column for every header that names a known
/// table column, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, u32)>,
}

impl HeaderMap {
    /// Intersects the sheet's header row with `columns`. Unknown headers are
    /// ignored; a repeated header keeps its left-most position.
    pub fn from_sheet<S: Sheet + ?Sized>(sheet: &S, columns: &[Column]) -> Self {
        let mut entries: Vec<(String, u32)> = Vec::new();
        for index in 1..=sheet.column_count() {
            let field = match sheet.cell(HEADER_ROW, index).value {
                Value::Null => continue,
                value => value.to_string(),
            };
            let known = columns.iter().any(|column| column.name == field);
            let seen = entries.iter().any(|(name, _)| *name == field);
            if known && !seen {
                entries.push((field, index));
            }
        }
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .iter()
            .map(|(name, index)| (name.as_str(), *index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Evaluates every mapped cell of `row`.
///
/// Returns `None` when no cell contributed a value. The first failing cell
/// aborts the row.
pub fn build_record<S, G, R>(
    evaluator: &mut Evaluator<R>,
    gateway: &mut G,
    sheet: &S,
    headers: &HeaderMap,
    row: u32,
) -> Result<Option<Record>>
where
    S: Sheet + ?Sized,
    G: Gateway + ?Sized,
    R: Rng,
{
    let mut record = Record::new();
    for (field, column) in headers.iter() {
        let cell = sheet.cell(row, column);
        let address = cell_address(row, column);
        if let Some(value) = evaluator.evaluate(&cell, &address, gateway)? {
            record.insert(field, value);
        }
    }
    Ok((!record.is_empty()).then_some(record))
}

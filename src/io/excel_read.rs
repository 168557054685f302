use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::error::{AssistError, Result};
use crate::model::Value;
use crate::sheet::{Sheet, SheetCell};

/// First worksheet of an `.xlsx` workbook, loaded with its formulas.
#[derive(Debug)]
pub struct XlsxSheet {
    name: String,
    values: Range<DataType>,
    formulas: Option<Range<String>>,
}

/// Reads the first worksheet of the workbook at `path`.
pub fn read_first_sheet(path: &Path) -> Result<XlsxSheet> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AssistError::InvalidWorkbook("workbook has no worksheets".into()))?;
    read_sheet(&mut workbook, &name)
}

fn read_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<XlsxSheet> {
    let values = workbook
        .worksheet_range(name)
        .ok_or_else(|| AssistError::InvalidWorkbook(format!("missing sheet '{name}'")))?
        .map_err(AssistError::from)?;
    let formulas = workbook
        .worksheet_formula(name)
        .transpose()
        .map_err(AssistError::from)?;
    Ok(XlsxSheet {
        name: name.to_string(),
        values,
        formulas,
    })
}

impl Sheet for XlsxSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_count(&self) -> u32 {
        self.values.end().map(|(row, _)| row + 1).unwrap_or(0)
    }

    fn column_count(&self) -> u32 {
        self.values.end().map(|(_, column)| column + 1).unwrap_or(0)
    }

    fn cell(&self, row: u32, column: u32) -> SheetCell {
        if row == 0 || column == 0 {
            return SheetCell::empty();
        }
        let position = (row - 1, column - 1);
        let formula = self
            .formulas
            .as_ref()
            .and_then(|range| range.get_value(position))
            .filter(|formula| !formula.is_empty())
            .cloned();
        SheetCell {
            formula,
            value: cell_to_value(self.values.get_value(position)),
        }
    }
}

fn cell_to_value(cell: Option<&DataType>) -> Value {
    match cell {
        Some(DataType::String(value)) => Value::Text(value.clone()),
        Some(DataType::Float(value)) => float_to_value(*value),
        Some(DataType::Int(value)) => Value::Int(*value),
        Some(DataType::Bool(value)) => Value::Bool(*value),
        Some(DataType::Empty) | None => Value::Null,
        Some(other) => Value::Text(other.to_string()),
    }
}

/// Workbooks store every number as a float; whole numbers come back as
/// integers.
fn float_to_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::Int(value as i64)
    } else {
        Value::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_floats_become_integers() {
        assert_eq!(float_to_value(3.0), Value::Int(3));
        assert_eq!(float_to_value(-2.0), Value::Int(-2));
        assert_eq!(float_to_value(2.5), Value::Float(2.5));
    }

    #[test]
    fn converts_cell_types() {
        assert_eq!(cell_to_value(None), Value::Null);
        assert_eq!(cell_to_value(Some(&DataType::Empty)), Value::Null);
        assert_eq!(cell_to_value(Some(&DataType::Bool(true))), Value::Bool(true));
        assert_eq!(
            cell_to_value(Some(&DataType::String("Ann".into()))),
            Value::from("Ann")
        );
    }
}

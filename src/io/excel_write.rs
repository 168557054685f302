use std::path::Path;

use rust_xlsxwriter::{DocProperties, Format, Workbook, Worksheet};

use crate::error::Result;
use crate::model::{Column, Row, Value};
use crate::sheet::{FIRST_DATA_ROW, HEADER_ROW, METADATA_ROW};

const AUTHOR: &str = "db-assist";
const PAPER_A4: u8 = 9;
const MAX_SHEET_NAME: usize = 31;

/// Writes `rows` of `table` to a single-sheet workbook at `path`.
///
/// Row 1 holds the column names, row 2 the column attributes and the data
/// follows from row 3, which is the layout the importer reads back.
pub fn write_table(path: &Path, table: &str, columns: &[Column], rows: &[Row]) -> Result<()> {
    let mut workbook = Workbook::new();
    workbook.set_properties(&DocProperties::new().set_author(AUTHOR));

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sanitize_sheet_name(table))?;
    worksheet.set_landscape();
    worksheet.set_paper_size(PAPER_A4);

    let bold = Format::new().set_bold();
    for (index, column) in columns.iter().enumerate() {
        let col = index as u16;
        worksheet.write_string_with_format(HEADER_ROW - 1, col, &column.name, &bold)?;
        worksheet.write_string_with_format(
            METADATA_ROW - 1,
            col,
            &column_attributes(column),
            &bold,
        )?;
    }

    for (offset, row) in rows.iter().enumerate() {
        let sheet_row = FIRST_DATA_ROW - 1 + offset as u32;
        for (index, column) in columns.iter().enumerate() {
            if let Some(value) = row.get(&column.name) {
                write_value(worksheet, sheet_row, index as u16, value)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Int(number) => {
            worksheet.write_number(row, col, *number as f64)?;
        }
        Value::Float(number) => {
            worksheet.write_number(row, col, *number)?;
        }
        Value::Bool(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        Value::Text(text) => {
            worksheet.write_string(row, col, text)?;
        }
    }
    Ok(())
}

/// Human-readable summary such as `pkey|auto_inc|INTEGER` or
/// `unique|notnull|TEXT`.
pub fn column_attributes(column: &Column) -> String {
    let mut attrs = Vec::new();
    if column.primary {
        attrs.push("pkey");
        if column.auto_increment {
            attrs.push("auto_inc");
        }
    }
    if column.foreign {
        attrs.push("fkey");
    }
    if column.unique {
        attrs.push("unique");
    }
    if !column.nullable && !column.primary && !column.auto_increment {
        attrs.push("notnull");
    }
    attrs.push(column.data_type.as_str());
    attrs.join("|")
}

/// Replaces characters Excel rejects in sheet names and truncates to the
/// 31-character limit.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "Sheet".to_string();
    }
    sanitized.chars().take(MAX_SHEET_NAME).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_for_keys() {
        let id = Column::new("id", "INTEGER").primary().auto_increment();
        assert_eq!(column_attributes(&id), "pkey|auto_inc|INTEGER");

        let team = Column::new("team_id", "INTEGER").references("teams").not_null();
        assert_eq!(column_attributes(&team), "fkey|notnull|INTEGER");

        let email = Column::new("email", "VARCHAR(120)").unique();
        assert_eq!(column_attributes(&email), "unique|VARCHAR(120)");
    }

    #[test]
    fn sheet_names_are_made_valid() {
        assert_eq!(sanitize_sheet_name("users"), "users");
        assert_eq!(sanitize_sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   "), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
    }
}

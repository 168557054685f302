use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::eval::Evaluator;
use crate::gateway::{Gateway, SaveOutcome};
use crate::model::Column;
use crate::io::excel_read;
use crate::io::excel_write;
use crate::record::{HeaderMap, build_record};
use crate::sheet::{FIRST_DATA_ROW, Sheet};

/// Number of rows exported per table unless told otherwise.
pub const DEFAULT_EXPORT_LIMIT: usize = 100;

/// Counts of what one import did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub table: String,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Rows without any data.
    pub skipped: usize,
}

/// Applies workbooks to their tables through one gateway.
///
/// Rows are processed one at a time in sheet order and each file ends with a
/// single commit. A failing row stops the import; rows saved before it are
/// committed and stay applied.
pub struct Importer<'g, G: Gateway + ?Sized, R = StdRng> {
    gateway: &'g mut G,
    evaluator: Evaluator<R>,
}

impl<'g, G: Gateway + ?Sized> Importer<'g, G> {
    pub fn new(gateway: &'g mut G) -> Self {
        Self::with_evaluator(gateway, Evaluator::new())
    }
}

impl<'g, G: Gateway + ?Sized, R: Rng> Importer<'g, G, R> {
    pub fn with_evaluator(gateway: &'g mut G, evaluator: Evaluator<R>) -> Self {
        Self { gateway, evaluator }
    }

    /// Imports the first worksheet of the workbook at `path` into the table
    /// named after that worksheet.
    #[instrument(level = "info", skip_all, fields(input = %path.display()))]
    pub fn import_file(&mut self, path: &Path) -> Result<ImportSummary> {
        let sheet = excel_read::read_first_sheet(path)?;
        self.import_sheet(&sheet)
    }

    /// Imports every data row of `sheet`, then commits.
    #[instrument(level = "debug", skip_all, fields(table = sheet.name()))]
    pub fn import_sheet<S: Sheet + ?Sized>(&mut self, sheet: &S) -> Result<ImportSummary> {
        self.evaluator.reset();
        let table = sheet.name().to_string();
        let columns = self.gateway.columns(&table)?;
        let headers = HeaderMap::from_sheet(sheet, &columns);
        debug!(mapped = headers.len(), "header row mapped");

        let mut summary = ImportSummary {
            table,
            ..ImportSummary::default()
        };
        if let Err(err) = self.apply_rows(sheet, &columns, &headers, &mut summary) {
            warn!(
                table = %summary.table,
                applied = summary.inserted + summary.updated,
                error = %err,
                "import stopped, committing rows saved so far"
            );
            if let Err(commit_err) = self.gateway.commit() {
                warn!(error = %commit_err, "commit after failed import did not succeed");
            }
            return Err(err);
        }

        self.gateway.commit()?;
        info!(
            table = %summary.table,
            inserted = summary.inserted,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            "import committed"
        );
        Ok(summary)
    }

    fn apply_rows<S: Sheet + ?Sized>(
        &mut self,
        sheet: &S,
        columns: &[Column],
        headers: &HeaderMap,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        for row in FIRST_DATA_ROW..=sheet.row_count() {
            let record = build_record(&mut self.evaluator, &mut *self.gateway, sheet, headers, row)?;
            let Some(record) = record else {
                summary.skipped += 1;
                continue;
            };
            match self.gateway.save(&summary.table, columns, &record)? {
                SaveOutcome::Inserted => summary.inserted += 1,
                SaveOutcome::Updated => summary.updated += 1,
                SaveOutcome::Unchanged => summary.unchanged += 1,
            }
        }
        Ok(())
    }
}

/// Exports up to `limit` rows of each table into `<output>/<table>.xlsx`.
///
/// Tables are processed one at a time in name order; `only` restricts the
/// export to the listed tables when non-empty.
#[instrument(level = "info", skip_all, fields(output = %output.display(), limit = limit))]
pub fn export_tables<G: Gateway + ?Sized>(
    gateway: &mut G,
    output: &Path,
    limit: usize,
    only: &[String],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output)?;
    let tables = gateway.tables()?;
    let mut written = Vec::new();
    for table in tables
        .iter()
        .filter(|table| only.is_empty() || only.contains(&table.name))
    {
        let rows = gateway.select(&table.name, limit, None)?;
        let columns = gateway.columns(&table.name)?;
        let sheet_name = excel_write::sanitize_sheet_name(&table.name);
        if sheet_name != table.name {
            warn!(
                table = %table.name,
                sheet = %sheet_name,
                "sheet name differs from table name, re-importing this file will target another table"
            );
        }
        let path = output.join(format!("{}.xlsx", table.name));
        excel_write::write_table(&path, &table.name, &columns, &rows)?;
        info!(table = %table.name, rows = rows.len(), "table exported");
        written.push(path);
    }
    Ok(written)
}

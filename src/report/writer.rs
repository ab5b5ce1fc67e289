//! Workbook writer backed by rust_xlsxwriter.
//!
//! Each table of an [`ExportBundle`] becomes one worksheet, in bundle
//! order. Header rows are bold; numbers and booleans keep their cell type.

use crate::error::PipelineError;
use crate::models::Value;
use crate::report::builder::{ExportBundle, Table};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::{debug, info};

/// Serialize a bundle to xlsx bytes.
pub fn write_workbook(bundle: &ExportBundle) -> Result<Vec<u8>, PipelineError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for table in &bundle.tables {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&table.name)?;
        write_table(sheet, table, &header)?;
        sheet.autofit();
        debug!("Wrote sheet '{}' ({} rows)", table.name, table.rows.len());
    }

    let bytes = workbook.save_to_buffer()?;
    Ok(bytes)
}

fn write_table(sheet: &mut Worksheet, table: &Table, header: &Format) -> Result<(), PipelineError> {
    for (row_idx, row) in table.rows.iter().enumerate() {
        let r = u32::try_from(row_idx)
            .map_err(|_| PipelineError::Write(format!("{}: too many rows", table.name)))?;
        let is_header = table.has_header && row_idx == 0;

        for (col_idx, cell) in row.iter().enumerate() {
            let c = u16::try_from(col_idx)
                .map_err(|_| PipelineError::Write(format!("{}: too many columns", table.name)))?;

            match (cell, is_header) {
                (Value::Empty, _) => {}
                (Value::Text(s), true) => {
                    sheet.write_string_with_format(r, c, s, header)?;
                }
                (Value::Text(s), false) => {
                    sheet.write_string(r, c, s)?;
                }
                (Value::Number(n), true) => {
                    sheet.write_number_with_format(r, c, *n, header)?;
                }
                (Value::Number(n), false) => {
                    sheet.write_number(r, c, *n)?;
                }
                (Value::Bool(b), true) => {
                    sheet.write_boolean_with_format(r, c, *b, header)?;
                }
                (Value::Bool(b), false) => {
                    sheet.write_boolean(r, c, *b)?;
                }
            }
        }
    }
    Ok(())
}

/// Serialize a bundle off the async runtime and write it to `path`.
/// Returns the number of bytes written.
pub async fn export_to_file(bundle: ExportBundle, path: &Path) -> Result<usize, PipelineError> {
    let bytes = tokio::task::spawn_blocking(move || write_workbook(&bundle))
        .await
        .map_err(|e| PipelineError::Write(format!("export task failed: {}", e)))??;

    tokio::fs::write(path, &bytes).await?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(bytes.len())
}

//! Spreadsheet reader backed by calamine.
//!
//! The first row of a sheet is the header row; every following non-blank
//! row becomes one [`Record`]. Empty cells are left out of the record, so
//! a missing field and an empty field look the same downstream.

use crate::error::PipelineError;
use crate::models::{Record, Value};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, info};

/// Header used for columns whose header cell is empty.
const EMPTY_HEADER: &str = "__EMPTY";

/// Parse the first sheet of a workbook into records.
///
/// Fails if the bytes are not a readable workbook, the workbook has no
/// sheets, or the first sheet has no data rows.
pub fn parse(bytes: &[u8]) -> Result<Vec<Record>, PipelineError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_names = workbook.sheet_names();
    debug!("Workbook sheets: {:?}", sheet_names);

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::Parse("workbook contains no sheets".to_string()))??;

    let records = records_from_range(&range);
    if records.is_empty() {
        return Err(PipelineError::Parse(
            "no data found in the first sheet".to_string(),
        ));
    }

    info!(
        "Parsed {} records from sheet '{}'",
        records.len(),
        sheet_names.first().map(String::as_str).unwrap_or_default()
    );
    Ok(records)
}

/// Read a named sheet into records. A sheet with only a header row (or
/// nothing at all) yields an empty list rather than an error.
#[cfg(test)]
pub fn read_sheet(bytes: &[u8], sheet: &str) -> Result<Vec<Record>, PipelineError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook.worksheet_range(sheet)?;
    Ok(records_from_range(&range))
}

/// Convert a cell range into records using its first row as headers.
pub fn records_from_range(range: &Range<Data>) -> Vec<Record> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers = header_names(header_row);

    rows.filter_map(|row| {
        let record: Record = headers
            .iter()
            .zip(row)
            .filter_map(|(header, cell)| cell_value(cell).map(|value| (header.clone(), value)))
            .collect();
        (!record.is_empty()).then_some(record)
    })
    .collect()
}

/// Column names from the header row, with blanks and duplicates made unique.
fn header_names(row: &[Data]) -> Vec<String> {
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(row.len());

    for cell in row {
        let base = cell_value(cell)
            .map(|v| v.to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| EMPTY_HEADER.to_string());

        let mut name = base.clone();
        while let Some(count) = used.get_mut(&name) {
            *count += 1;
            name = format!("{}_{}", base, count);
        }
        used.insert(name.clone(), 0);
        names.push(name);
    }

    names
}

/// Map a calamine cell to a record value; empty cells map to `None`.
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(Value::Text(s.clone())),
        Data::Float(n) => Some(Value::Number(*n)),
        Data::Int(n) => Some(Value::Number(*n as f64)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        // Serial date number, as spreadsheet tools report it without date parsing
        Data::DateTime(dt) => Some(Value::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::Text(s.clone())),
        Data::Error(e) => Some(Value::Text(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn range_from(rows: &[&[Data]]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn test_records_from_range() {
        let range = range_from(&[
            &[text("Region"), text("Task"), text("Qty")],
            &[text("East"), text("Install"), Data::Float(3.0)],
            &[text("West"), Data::Empty, Data::Int(2)],
        ]);

        let records = records_from_range(&range);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Region"], Value::from("East"));
        assert_eq!(records[0]["Qty"], Value::Number(3.0));
        assert!(!records[1].contains_key("Task"));
        assert_eq!(records[1]["Qty"], Value::Number(2.0));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let range = range_from(&[
            &[text("Region")],
            &[Data::Empty],
            &[text("North")],
        ]);
        let records = records_from_range(&range);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Region"], Value::from("North"));
    }

    #[test]
    fn test_header_names_unique() {
        let names = header_names(&[
            text("Name"),
            Data::Empty,
            text("Name"),
            Data::Empty,
            text("Name"),
        ]);
        assert_eq!(
            names,
            vec!["Name", "__EMPTY", "Name_1", "__EMPTY_1", "Name_2"]
        );
    }

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&Data::Bool(true)), Some(Value::Bool(true)));
        assert_eq!(cell_value(&text("")), None);
        assert_eq!(cell_value(&Data::Empty), None);
        assert_eq!(
            cell_value(&Data::DateTimeIso("2024-01-02".to_string())),
            Some(Value::from("2024-01-02"))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn test_parse_first_sheet() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Region").unwrap();
        sheet.write_string(0, 1, "Task Assignment").unwrap();
        sheet.write_string(1, 0, "East").unwrap();
        sheet.write_string(1, 1, "Install").unwrap();
        sheet.write_string(2, 0, "West").unwrap();
        sheet.write_number(2, 1, 42.0).unwrap();
        let other = workbook.add_worksheet();
        other.write_string(0, 0, "Ignored").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let records = parse(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Task Assignment"], Value::from("Install"));
        assert_eq!(records[1]["Task Assignment"], Value::Number(42.0));
    }

    #[test]
    fn test_parse_header_only_sheet_fails() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Region").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("no data"));
    }

    #[test]
    fn test_read_sheet_by_name() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("First").unwrap();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Second").unwrap();
        sheet.write_string(0, 0, "Task").unwrap();
        sheet.write_string(1, 0, "Repair").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let records = read_sheet(&bytes, "Second").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Task"], Value::from("Repair"));

        assert!(read_sheet(&bytes, "Missing").is_err());
    }
}

//! Decoding CSV text and workbook sheets into [Table]s.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use time::{Date, Duration, macros::date};

use crate::{Error, source::Table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode CSV bytes where the first record is the header row.
///
/// Rows that only contain blank cells are skipped. Rows are allowed to have a
/// different number of cells than the header.
///
/// # Errors
/// Returns [Error::InvalidTable] if the bytes are not valid CSV or UTF-8, or
/// if the text looks like an HTML page (e.g. a Google sign-in page for a sheet
/// that has not been published).
pub(super) fn decode_csv(name: &str, bytes: &[u8]) -> Result<Table, Error> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let invalid = |reason: String| Error::InvalidTable(name.to_owned(), reason);

    if looks_like_html(bytes) {
        return Err(invalid(
            "expected CSV but got an HTML page, check that the sheet is published as CSV"
                .to_owned(),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|error| invalid(error.to_string()))?
        .iter()
        .map(|header| header.trim().to_owned())
        .collect();

    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|error| invalid(format!("row {}: {error}", index + 2)))?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        rows.push(record.iter().map(|cell| cell.trim().to_owned()).collect());
    }

    Ok(Table {
        name: name.to_owned(),
        headers,
        rows,
    })
}

fn looks_like_html(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let prefix = &bytes[start..bytes.len().min(start + 15)];
    let prefix = String::from_utf8_lossy(prefix).to_ascii_lowercase();

    prefix.starts_with("<!doctype html") || prefix.starts_with("<html")
}

/// Read a worksheet from a workbook file as a table.
///
/// If `sheet` is `None` the first worksheet is read. Sheet names are matched
/// case-insensitively.
///
/// # Errors
/// Returns [Error::DataSourceUnavailable] if the workbook cannot be opened,
/// [Error::SheetNotFound] if `sheet` is not in the workbook, and
/// [Error::InvalidTable] if the sheet cannot be read.
pub(super) fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Table, Error> {
    let mut workbook = open_workbook_auto(path).map_err(|error| {
        Error::DataSourceUnavailable(path.display().to_string(), error.to_string())
    })?;

    let sheet_names = workbook.sheet_names().to_vec();

    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.trim().eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| Error::SheetNotFound {
                sheet: wanted.to_owned(),
                available: sheet_names.join(", "),
            })?,
        None => sheet_names.first().cloned().ok_or_else(|| {
            Error::InvalidTable(path.display().to_string(), "the workbook has no sheets".to_owned())
        })?,
    };

    let name = format!("{}#{sheet_name}", path.display());
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|error| Error::InvalidTable(name.clone(), error.to_string()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());

    let headers = rows.next().unwrap_or_default();
    let rows = rows
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    Ok(Table {
        name,
        headers,
        rows,
    })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_owned(),
        Data::Int(number) => number.to_string(),
        Data::Float(number) => number.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::Error(error) => format!("#ERR({error:?})"),
        Data::DateTime(date_time) => excel_serial_to_date(date_time.as_f64())
            .map(|date| date.to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(text) => text.clone(),
        Data::DurationIso(text) => text.clone(),
    }
}

/// Convert an Excel serial date (days since 1899-12-30) to a calendar date.
///
/// Workbook date cells are written out as `YYYY-MM-DD` text so that they go
/// through the same date parsing as cells read from CSV. The fractional part
/// of the serial is the time of day and is dropped. calamine's own conversion
/// needs its `chrono` feature.
fn excel_serial_to_date(serial: f64) -> Option<Date> {
    const EXCEL_EPOCH: Date = date!(1899 - 12 - 30);

    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    EXCEL_EPOCH.checked_add(Duration::days(serial.floor() as i64))
}

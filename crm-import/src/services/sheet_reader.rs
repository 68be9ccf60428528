//! Spreadsheet intake
//!
//! Reads the first worksheet of a workbook (xlsx, xlsm, xlsb, xls, ods) or a
//! delimited text file into ordered [`RawRow`]s. The first row holds the
//! headers. All reads are blocking; async callers go through
//! `tokio::task::spawn_blocking`.

use crate::error::{ImportError, ImportResult};
use crate::models::RawRow;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, TimeDelta};
use std::collections::HashSet;
use std::path::Path;

/// Header given to blank header cells; repeats get `_1`, `_2`, ...
pub const EMPTY_HEADER: &str = "__EMPTY";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Physical layout of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Workbook,
    Delimited,
}

/// One sheet row: 1-based row number and cell text
type GridRow = (usize, Vec<String>);

/// Pick the reader from the file extension
pub fn detect_format(path: &Path) -> ImportResult<SheetFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SheetFormat::Workbook),
        "csv" | "tsv" | "txt" => Ok(SheetFormat::Delimited),
        "" => Err(ImportError::validation("Unsupported file type: no extension")),
        other => Err(ImportError::validation(format!(
            "Unsupported file type '.{}'",
            other
        ))),
    }
}

/// Read every non-blank data row, keyed by header
pub fn read_rows(path: &Path) -> ImportResult<Vec<RawRow>> {
    let grid = read_grid(path)?;
    let rows = grid_to_rows(grid);

    if rows.is_empty() {
        return Err(ImportError::validation("Excel file is empty"));
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "Read sheet rows");
    Ok(rows)
}

/// Header row only
pub fn read_headers(path: &Path) -> ImportResult<Vec<String>> {
    let grid = read_grid(path)?;

    let headers = grid
        .into_iter()
        .next()
        .map(|(_, cells)| cells)
        .unwrap_or_default();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::validation("No headers found in file"));
    }

    Ok(unique_headers(headers))
}

fn read_grid(path: &Path) -> ImportResult<Vec<GridRow>> {
    match detect_format(path)? {
        SheetFormat::Workbook => workbook_grid(path),
        SheetFormat::Delimited => delimited_grid(path),
    }
}

fn workbook_grid(path: &Path) -> ImportResult<Vec<GridRow>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ImportError::validation(format!("Failed to open spreadsheet: {}", e)))?;

    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::validation("Excel file is empty"))?;

    let range = workbook.worksheet_range(&first_sheet).map_err(|e| {
        ImportError::validation(format!("Failed to read sheet '{}': {}", first_sheet, e))
    })?;

    // The range starts at the first used cell, not necessarily A1
    let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    Ok(range
        .rows()
        .enumerate()
        .map(|(offset, cells)| (first_row + offset, cells.iter().map(cell_to_string).collect()))
        .collect())
}

fn delimited_grid(path: &Path) -> ImportResult<Vec<GridRow>> {
    let bytes = std::fs::read(path)
        .map_err(|e| ImportError::validation(format!("Failed to open file: {}", e)))?;
    let text = String::from_utf8_lossy(&bytes);
    let content = text.strip_prefix('\u{feff}').unwrap_or(&*text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(content))
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| ImportError::validation(format!("Failed to parse file: {}", e)))?;
        let row_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);
        grid.push((row_number, record.iter().map(str::to_string).collect()));
    }

    Ok(grid)
}

/// Delimiters tried for delimited text; earlier entries win ties
const DELIMITERS: &[u8] = &[b',', b';', b'\t', b'|'];

/// Data lines checked against the header row when sniffing
const SNIFF_DATA_LINES: usize = 20;

/// Pick the delimiter that splits the header row
///
/// A candidate must give the header at least two columns. The one with the
/// most data lines of the same width wins, then the wider header. Blank lines
/// are skipped.
fn sniff_delimiter(content: &str) -> u8 {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return b',';
    };
    let data: Vec<&str> = lines.take(SNIFF_DATA_LINES).collect();

    DELIMITERS
        .iter()
        .rev()
        .filter_map(|&delim| {
            let width = field_count(header, delim);
            if width < 2 {
                return None;
            }
            let agreeing = data
                .iter()
                .filter(|line| field_count(line, delim) == width)
                .count();
            Some((agreeing, width, delim))
        })
        .max_by_key(|&(agreeing, width, _)| (agreeing, width))
        .map(|(_, _, delim)| delim)
        .unwrap_or(b',')
}

/// Fields in one line under `delim`, honouring quotes
fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|record| record.ok())
        .map(|record| record.len())
        .unwrap_or(1)
}

/// Text of one workbook cell; empty and error cells become ""
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Phone numbers typed into numeric cells come back as floats
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => serial_to_iso(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// ISO date (or date-time) for an Excel 1900-system serial
fn serial_to_iso(serial: f64) -> String {
    let millis = (serial * MILLIS_PER_DAY as f64).round() as i64;

    let datetime = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .zip(TimeDelta::try_milliseconds(millis))
        .and_then(|(epoch, delta)| epoch.checked_add_signed(delta));

    match datetime {
        Some(dt) if millis % MILLIS_PER_DAY == 0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => serial.to_string(),
    }
}

/// Name blank headers and suffix repeated ones so every header is distinct
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for header in raw {
        let base = if header.trim().is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            header
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        seen.insert(candidate.clone());
        headers.push(candidate);
    }

    headers
}

/// Key data rows by header, skipping blank rows and blank cells
fn grid_to_rows(grid: Vec<GridRow>) -> Vec<RawRow> {
    let mut grid = grid.into_iter();
    let Some((_, header_cells)) = grid.next() else {
        return Vec::new();
    };

    let data: Vec<GridRow> = grid.collect();
    let width = data
        .iter()
        .map(|(_, cells)| cells.len())
        .chain(std::iter::once(header_cells.len()))
        .max()
        .unwrap_or(0);

    // Cells past the header row's end still get a (blank-derived) header
    let mut header_cells = header_cells;
    header_cells.resize(width, String::new());
    let headers = unique_headers(header_cells);

    data.into_iter()
        .filter_map(|(row_number, cells)| {
            let cells: Vec<(String, String)> = headers
                .iter()
                .zip(cells)
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(header, value)| (header.clone(), value))
                .collect();

            (!cells.is_empty()).then_some(RawRow { row_number, cells })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn grid(rows: &[&[&str]]) -> Vec<GridRow> {
        rows.iter()
            .enumerate()
            .map(|(i, cells)| (i + 1, cells.iter().map(|c| c.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("leads.XLSX")).unwrap(), SheetFormat::Workbook);
        assert_eq!(detect_format(Path::new("leads.ods")).unwrap(), SheetFormat::Workbook);
        assert_eq!(detect_format(Path::new("leads.csv")).unwrap(), SheetFormat::Delimited);
        assert!(detect_format(Path::new("leads.pdf")).unwrap_err().is_validation());
        assert!(detect_format(Path::new("leads")).unwrap_err().is_validation());
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a,b\n1,2\n"), b',');
        assert_eq!(sniff_delimiter("single"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_sniff_follows_header_not_free_text() {
        // Commas inside notes must not outvote the header's semicolons
        let content = "Name;Notes\nAsha;hot, urgent, call back\nRavi;cold, retry\n";
        assert_eq!(sniff_delimiter(content), b';');

        // Quoted delimiters do not count
        let content = "\n\nName,Mobile\n\"Asha; K\",9876543210\n";
        assert_eq!(sniff_delimiter(content), b',');

        // Equal agreement falls back to the earlier candidate
        assert_eq!(sniff_delimiter("a,b;c\n"), b',');
    }

    #[test]
    fn test_cell_coercion() {
        assert_eq!(cell_to_string(&Data::Float(9876543210.0)), "9876543210");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_serial_to_iso() {
        assert_eq!(serial_to_iso(45292.0), "2024-01-01");
        assert_eq!(serial_to_iso(45292.5), "2024-01-01T12:00:00");
    }

    #[test]
    fn test_blank_and_repeated_headers() {
        let headers = unique_headers(vec![
            "Name".to_string(),
            "".to_string(),
            "Name".to_string(),
            " ".to_string(),
        ]);
        assert_eq!(headers, vec!["Name", "__EMPTY", "Name_1", "__EMPTY_1"]);
    }

    #[test]
    fn test_grid_to_rows_skips_blank_rows_and_cells() {
        let rows = grid_to_rows(grid(&[
            &["Full Name", "Mobile", "City"],
            &["Asha", "9876543210", ""],
            &["", "  ", ""],
            &["Ravi", "9123456780", "Pune", "extra"],
        ]));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].cells.len(), 2);
        assert_eq!(rows[1].row_number, 4);
        assert_eq!(rows[1].cells[3], ("__EMPTY".to_string(), "extra".to_string()));
    }

    #[test]
    fn test_header_only_sheet_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(&path, "Name,Mobile\n").unwrap();

        let err = read_rows(&path).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Excel file is empty"));
        assert_eq!(read_headers(&path).unwrap(), vec!["Name", "Mobile"]);
    }

    #[test]
    fn test_read_csv_with_bom_and_semicolons() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(&path, "\u{feff}Name;Mobile\nAsha;98765 43210\n").unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].cells,
            vec![
                ("Name".to_string(), "Asha".to_string()),
                ("Mobile".to_string(), "98765 43210".to_string()),
            ]
        );
    }

    #[test]
    fn test_read_xlsx_first_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leads.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Full Name").unwrap();
        sheet.write_string(0, 1, "Mobile").unwrap();
        sheet.write_string(1, 0, "Asha").unwrap();
        sheet.write_number(1, 1, 9876543210.0).unwrap();
        let other = workbook.add_worksheet();
        other.write_string(0, 0, "ignored").unwrap();
        workbook.save(&path).unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].cells[1], ("Mobile".to_string(), "9876543210".to_string()));

        assert_eq!(read_headers(&path).unwrap(), vec!["Full Name", "Mobile"]);
    }

    #[test]
    fn test_unreadable_workbook_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();

        assert!(read_rows(&path).unwrap_err().is_validation());
    }

    #[test]
    fn test_empty_header_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.csv");
        std::fs::write(&path, ",,\n").unwrap();

        let err = read_headers(&path).unwrap_err();
        assert!(err.to_string().contains("No headers found in file"));
    }
}

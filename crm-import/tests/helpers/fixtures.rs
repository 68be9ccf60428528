//! Spreadsheet fixture writers

use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Write `rows` (first row = headers) as a single-sheet xlsx workbook
///
/// Empty strings leave the cell blank.
pub fn write_xlsx(path: &Path, rows: &[&[&str]]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (row, cells) in rows.iter().enumerate() {
        for (col, value) in cells.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            sheet
                .write_string(row as u32, col as u16, *value)
                .expect("Failed to write fixture cell");
        }
    }

    workbook.save(path).expect("Failed to save fixture workbook");
}

pub fn write_csv(path: &Path, content: &str) {
    std::fs::write(path, content).expect("Failed to write fixture csv");
}

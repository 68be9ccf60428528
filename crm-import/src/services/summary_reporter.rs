//! Reconciliation summary workbook
//!
//! One worksheet per non-empty partition (`Imported_<Kind>`,
//! `Duplicate_<Kind>`). Columns: name, phone, email, city, the three
//! classification names, then every attribute in first-seen order.

use crate::error::{ImportError, ImportResult};
use crate::models::lead::{CITY_FIELD, EMAIL_FIELD};
use crate::models::{CanonicalRecord, LeadKind};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// A written summary workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryArtifact {
    pub path: PathBuf,
    /// Worksheet names in workbook order
    pub sheets: Vec<String>,
}

/// Writes summary workbooks into one directory
#[derive(Debug, Clone)]
pub struct SummaryReporter {
    dir: PathBuf,
}

impl SummaryReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Build and save the workbook; blocking
    pub fn write(
        &self,
        kind: LeadKind,
        inserted: &[CanonicalRecord],
        duplicates: &[CanonicalRecord],
    ) -> ImportResult<SummaryArtifact> {
        if inserted.is_empty() && duplicates.is_empty() {
            return Err(ImportError::validation("Nothing to report"));
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ImportError::Storage(format!(
                "Failed to create summary directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut workbook = Workbook::new();
        let mut sheets = Vec::new();

        for (prefix, records) in [("Imported", inserted), ("Duplicate", duplicates)] {
            if records.is_empty() {
                continue;
            }
            let name = format!("{}_{}", prefix, kind.plural_title());
            let worksheet = workbook
                .add_worksheet()
                .set_name(&name)
                .map_err(|e| storage_error("create sheet", e))?;
            write_partition(worksheet, kind, records)?;
            sheets.push(name);
        }

        let path = self.next_path(kind);
        workbook
            .save(&path)
            .map_err(|e| storage_error("save summary workbook", e))?;

        tracing::info!(path = %path.display(), sheets = ?sheets, "Wrote import summary");

        Ok(SummaryArtifact { path, sheets })
    }

    /// `<kind>-summary-<unix-millis>.xlsx`, suffixed when the name is taken
    fn next_path(&self, kind: LeadKind) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        let base = format!("{}-summary-{}", kind, millis);
        let mut path = self.dir.join(format!("{}.xlsx", base));
        let mut counter = 1;
        while path.exists() {
            path = self.dir.join(format!("{}-{}.xlsx", base, counter));
            counter += 1;
        }
        path
    }
}

/// Column headers for one partition
fn columns(kind: LeadKind, records: &[CanonicalRecord]) -> Vec<String> {
    let mut columns: Vec<String> = [kind.name_field(), kind.phone_field(), EMAIL_FIELD, CITY_FIELD]
        .into_iter()
        .chain(kind.classification_fields())
        .map(str::to_string)
        .collect();

    for record in records {
        for key in record.attributes.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }

    columns
}

fn cell_values(record: &CanonicalRecord, columns: &[String]) -> Vec<String> {
    let class = &record.classification;
    let mut values = vec![
        record.name.clone(),
        record.phone_key.clone(),
        record.email.clone().unwrap_or_default(),
        record.city.clone(),
        class.campaign_name().to_string(),
        class.type_name().to_string(),
        class.sub_type_name().to_string(),
    ];

    for column in &columns[values.len()..] {
        values.push(record.attributes.get(column).unwrap_or_default().to_string());
    }

    values
}

fn write_partition(
    worksheet: &mut Worksheet,
    kind: LeadKind,
    records: &[CanonicalRecord],
) -> ImportResult<()> {
    let header_format = Format::new().set_bold();
    let columns = columns(kind, records);

    for (col, header) in columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(|e| storage_error("write header", e))?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        for (col, value) in cell_values(record, &columns).iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row, col as u16, value)
                .map_err(|e| storage_error("write cell", e))?;
        }
    }

    Ok(())
}

fn storage_error(action: &str, e: rust_xlsxwriter::XlsxError) -> ImportError {
    ImportError::Storage(format!("Failed to {}: {}", action, e))
}

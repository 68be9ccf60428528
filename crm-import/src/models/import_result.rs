//! Import run results

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A row the bulk persister could not insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFailure {
    /// 1-based sheet row number
    pub row_number: usize,
    pub name: String,
    pub phone_key: String,
    pub error_message: String,
}

/// Immutable outcome of one import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Rows that passed the name + phone presence filter
    pub total_records: usize,
    pub inserted_count: usize,
    pub duplicate_count: usize,
    pub failed_count: usize,
    /// Location of the reconciliation workbook
    pub summary_artifact_path: PathBuf,
    pub failures: Vec<RowFailure>,
    pub duration_ms: u64,
}

impl ImportSummary {
    /// One-line message in the form shown to operators
    pub fn message(&self) -> String {
        let mut message = format!(
            "{} imported, {} duplicates.",
            self.inserted_count, self.duplicate_count
        );
        if self.failed_count > 0 {
            message.push_str(&format!(" {} failed.", self.failed_count));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let summary = ImportSummary {
            total_records: 3,
            inserted_count: 2,
            duplicate_count: 1,
            failed_count: 0,
            summary_artifact_path: PathBuf::from("/tmp/contact-summary-1.xlsx"),
            failures: Vec::new(),
            duration_ms: 12,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalRecords"], 3);
        assert_eq!(json["insertedCount"], 2);
        assert_eq!(json["duplicateCount"], 1);
        assert_eq!(json["summaryArtifactPath"], "/tmp/contact-summary-1.xlsx");
        assert_eq!(summary.message(), "2 imported, 1 duplicates.");
    }
}

//! crm-import library interface
//!
//! Bulk lead import: spreadsheet intake, header normalization, phone
//! canonicalization, classification reconciliation, duplicate detection,
//! best-effort persistence and the reconciliation summary workbook.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::config::{resolve_import_settings, ImportSettings};
pub use crate::error::{ImportError, ImportResult};
pub use crate::models::{ImportRequest, ImportSummary, LeadKind};
pub use crate::workflow::{ImportPipeline, TempUpload};

//! Data models for the bulk import engine

pub mod import_request;
pub mod import_result;
pub mod import_run;
pub mod lead;
pub mod master;

pub use import_request::{FieldMapping, ImportRequest};
pub use import_result::{ImportSummary, RowFailure};
pub use import_run::{ImportPhase, ImportRun};
pub use lead::{CanonicalRecord, FieldMap, LeadKind, NormalizedRow, PersistedRecord, RawRow};
pub use master::{
    Classification, ClassificationNames, MasterEntity, MasterLevel, MasterRef, MasterScope,
    Resolution,
};

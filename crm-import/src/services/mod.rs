//! Import pipeline stages

pub mod bulk_persister;
pub mod duplicate_detector;
pub mod header_normalizer;
pub mod hierarchy_reconciler;
pub mod phone_canonicalizer;
pub mod sheet_reader;
pub mod summary_reporter;

pub use bulk_persister::{BulkPersister, PersistOutcome};
pub use duplicate_detector::{DuplicateDetector, DuplicatePartition};
pub use header_normalizer::HeaderNormalizer;
pub use hierarchy_reconciler::{CreationStats, HierarchyReconciler};
pub use phone_canonicalizer::{PhoneCanonicalizer, PhoneRules};
pub use summary_reporter::{SummaryArtifact, SummaryReporter};

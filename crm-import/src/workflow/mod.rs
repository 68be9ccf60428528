//! Import pipeline
//!
//! # Phase progression
//! INTAKE → NORMALIZING → CANONICALIZING → RECONCILING → DETECTING → PERSISTING → REPORTING → COMPLETED
//!
//! A run is linear and single-task. Validation errors stop it before anything
//! is written; store failures abort it wherever they happen. The staged
//! upload is removed whichever way the run ends.

pub mod temp_upload;

pub use temp_upload::TempUpload;

use crate::config::ImportSettings;
use crate::error::{ImportError, ImportResult};
use crate::models::{
    CanonicalRecord, ImportPhase, ImportRequest, ImportRun, ImportSummary, NormalizedRow,
};
use crate::services::{
    sheet_reader, BulkPersister, DuplicateDetector, HeaderNormalizer, HierarchyReconciler,
    PhoneCanonicalizer, SummaryReporter,
};
use crm_common::ActingUser;
use sqlx::SqlitePool;

/// Drives one upload through every import stage
pub struct ImportPipeline {
    db: SqlitePool,
    settings: ImportSettings,
}

impl ImportPipeline {
    pub fn new(db: SqlitePool, settings: ImportSettings) -> Self {
        Self { db, settings }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Header row of an upload, for building a manual mapping
    pub async fn read_headers(&self, upload: TempUpload) -> ImportResult<Vec<String>> {
        let path = upload.path().to_path_buf();
        let headers = blocking(move || sheet_reader::read_headers(&path)).await;
        drop(upload);
        headers
    }

    /// Run a full import; the upload is consumed and removed
    pub async fn run(
        &self,
        upload: TempUpload,
        request: ImportRequest,
        actor: &ActingUser,
    ) -> ImportResult<ImportSummary> {
        let mut run = ImportRun::new(request.kind);
        tracing::info!(
            run_id = %run.run_id,
            kind = %request.kind,
            file = %upload.path().display(),
            actor = %actor.id,
            "Import started"
        );

        let result = self.execute(&mut run, &upload, &request, actor).await;

        match &result {
            Ok(summary) => {
                run.transition_to(ImportPhase::Completed);
                tracing::info!(
                    run_id = %run.run_id,
                    total = summary.total_records,
                    inserted = summary.inserted_count,
                    duplicates = summary.duplicate_count,
                    failed = summary.failed_count,
                    duration_ms = run.elapsed_ms(),
                    "Import completed"
                );
            }
            Err(e) => {
                let failed_in = run.phase;
                run.transition_to(ImportPhase::Failed);
                tracing::warn!(
                    run_id = %run.run_id,
                    phase = ?failed_in,
                    code = e.error_code(),
                    error = %e,
                    "Import failed"
                );
            }
        }

        drop(upload);
        result
    }

    async fn execute(
        &self,
        run: &mut ImportRun,
        upload: &TempUpload,
        request: &ImportRequest,
        actor: &ActingUser,
    ) -> ImportResult<ImportSummary> {
        let kind = request.kind;

        // Intake
        let mapping = request.validate()?;
        let path = upload.path().to_path_buf();
        let raw_rows = blocking(move || sheet_reader::read_rows(&path)).await?;

        run.transition_to(ImportPhase::Normalizing);
        let phone = PhoneCanonicalizer::new(self.settings.phone.clone());
        let normalizer = HeaderNormalizer::new(kind, mapping, phone);
        let normalized: Vec<NormalizedRow> =
            raw_rows.iter().map(|row| normalizer.normalize_row(row)).collect();

        run.transition_to(ImportPhase::Canonicalizing);
        let mut candidates = Vec::with_capacity(normalized.len());
        for mut row in normalized {
            for (field, value) in request.batch_fields.iter() {
                row.fields.insert(field, value);
            }
            if let Some(candidate) = CanonicalRecord::from_normalized(kind, row, actor) {
                candidates.push(candidate);
            }
        }

        tracing::info!(
            rows = raw_rows.len(),
            valid = candidates.len(),
            dropped = raw_rows.len() - candidates.len(),
            "Rows canonicalized"
        );
        if candidates.is_empty() {
            return Err(ImportError::validation(format!(
                "No valid rows found: every row needs a {} and a {}",
                kind.name_field(),
                kind.phone_field()
            )));
        }

        run.transition_to(ImportPhase::Reconciling);
        let mut reconciler = HierarchyReconciler::new(self.db.clone());
        let mut records = Vec::with_capacity(candidates.len());
        for (mut record, names) in candidates {
            let names = names.overridden_by(&request.batch_classification);
            record.classification = reconciler.reconcile(&names).await?;
            records.push(record);
        }
        let created = reconciler.created();
        tracing::info!(
            campaigns = created.campaigns,
            types = created.types,
            sub_types = created.sub_types,
            "Classification reconciled"
        );
        let total_records = records.len();

        run.transition_to(ImportPhase::Detecting);
        let partition = DuplicateDetector::new(self.db.clone())
            .partition(kind, records)
            .await?;
        let duplicates = partition.duplicates;

        run.transition_to(ImportPhase::Persisting);
        let outcome = BulkPersister::new(self.db.clone())
            .insert_all(partition.unique)
            .await?;

        if outcome.inserted.is_empty() && duplicates.is_empty() {
            return Err(ImportError::validation(format!(
                "No records imported: all {} rows failed to insert",
                outcome.failures.len()
            )));
        }

        run.transition_to(ImportPhase::Reporting);
        let reporter = SummaryReporter::new(self.settings.summary_dir.clone());
        let inserted = outcome.inserted;
        let (artifact, inserted_count, duplicate_count) = blocking(move || {
            let artifact = reporter.write(kind, &inserted, &duplicates)?;
            Ok((artifact, inserted.len(), duplicates.len()))
        })
        .await?;

        Ok(ImportSummary {
            total_records,
            inserted_count,
            duplicate_count,
            failed_count: outcome.failures.len(),
            summary_artifact_path: artifact.path,
            failures: outcome.failures,
            duration_ms: run.elapsed_ms(),
        })
    }
}

/// Run blocking spreadsheet I/O off the async runtime
async fn blocking<T, F>(task: F) -> ImportResult<T>
where
    F: FnOnce() -> ImportResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ImportError::Internal(format!("Blocking task failed: {}", e)))?
}

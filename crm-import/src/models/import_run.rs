//! Import run state machine
//!
//! A run moves strictly forward through:
//! INTAKE → NORMALIZING → CANONICALIZING → RECONCILING → DETECTING → PERSISTING → REPORTING → COMPLETED
//!
//! Any phase may end in FAILED. Runs are not resumable.

use crate::models::lead::LeadKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Import run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportPhase {
    /// Mapping validation, sheet reading
    Intake,
    /// Header normalization (phone columns canonicalized in place)
    Normalizing,
    /// Canonical record building, name + phone presence filter, audit stamping
    Canonicalizing,
    /// Classification find-or-create
    Reconciling,
    /// Existence check against persisted leads
    Detecting,
    /// Best-effort bulk insert
    Persisting,
    /// Summary workbook
    Reporting,
    Completed,
    Failed,
}

impl ImportPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportPhase::Completed | ImportPhase::Failed)
    }
}

/// In-memory tracking of one run
#[derive(Debug, Clone, Serialize)]
pub struct ImportRun {
    pub run_id: Uuid,
    pub kind: LeadKind,
    pub phase: ImportPhase,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ImportRun {
    pub fn new(kind: LeadKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            kind,
            phase: ImportPhase::Intake,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Move to `phase`, logging the transition
    pub fn transition_to(&mut self, phase: ImportPhase) {
        tracing::debug!(
            run_id = %self.run_id,
            kind = %self.kind,
            from = ?self.phase,
            to = ?phase,
            "Import phase transition"
        );
        self.phase = phase;
        if phase.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }

    /// Milliseconds since the run started (or until it ended)
    pub fn elapsed_ms(&self) -> u64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phase_sets_end_time() {
        let mut run = ImportRun::new(LeadKind::Customer);
        assert_eq!(run.phase, ImportPhase::Intake);

        run.transition_to(ImportPhase::Normalizing);
        assert!(run.ended_at.is_none());

        run.transition_to(ImportPhase::Failed);
        assert!(run.ended_at.is_some());
        assert!(run.phase.is_terminal());
    }
}

//! Per-run execution records.

use crate::core::{StageIndex, StageKind, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of one stage within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// The stage.
    pub kind: StageKind,
    /// How the stage ended.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageRecord {
    /// Creates a completed stage record.
    #[must_use]
    pub fn ok(kind: StageKind, started_at: DateTime<Utc>) -> Self {
        Self::finished(kind, StageStatus::Ok, started_at, None)
    }

    /// Creates a skipped stage record.
    #[must_use]
    pub fn skipped(kind: StageKind, started_at: DateTime<Utc>) -> Self {
        Self::finished(kind, StageStatus::Skip, started_at, None)
    }

    /// Creates a failed stage record.
    #[must_use]
    pub fn failed(kind: StageKind, started_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self::finished(kind, StageStatus::Fail, started_at, Some(error.into()))
    }

    fn finished(
        kind: StageKind,
        status: StageStatus,
        started_at: DateTime<Utc>,
        error: Option<String>,
    ) -> Self {
        Self {
            kind,
            status,
            started_at,
            ended_at: Utc::now(),
            error,
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds()
    }
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// The resume point the run started from.
    pub start_index: StageIndex,
    /// One record per stage visited, in order.
    pub stages: Vec<StageRecord>,
}

impl RunReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(run_id: Uuid, start_index: StageIndex) -> Self {
        Self {
            run_id,
            start_index,
            stages: Vec::new(),
        }
    }

    /// Appends a stage record.
    pub fn push(&mut self, record: StageRecord) {
        self.stages.push(record);
    }

    /// Returns the kinds of the stages with the given status.
    #[must_use]
    pub fn kinds_with(&self, status: StageStatus) -> Vec<StageKind> {
        self.stages
            .iter()
            .filter(|r| r.status == status)
            .map(|r| r.kind)
            .collect()
    }

    /// Returns the kinds of the stages that completed.
    #[must_use]
    pub fn executed(&self) -> Vec<StageKind> {
        self.kinds_with(StageStatus::Ok)
    }

    /// Returns the kinds of the stages that were skipped.
    #[must_use]
    pub fn skipped(&self) -> Vec<StageKind> {
        self.kinds_with(StageStatus::Skip)
    }

    /// Returns the failed stage record, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.status == StageStatus::Fail)
    }

    /// Returns true if no stage failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }
}

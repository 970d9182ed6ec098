use chrono::{DateTime, Utc};
use internship_core_api::{PrincipalRef, TrackerKind, TrackerStatus};
use serde::{Deserialize, Serialize};

/// # Documentation
/// - Row of `evaluation_status_trackers`: one evaluation obligation of a training.
/// - Exactly one row per (training, kind). `completed` is terminal.
/// - `version` guards concurrent assignment and completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerModel {
    pub id: i64,
    pub training_id: i64,
    pub kind: TrackerKind,
    pub evaluator: Option<PrincipalRef>,
    pub due_at: Option<DateTime<Utc>>,
    pub status: TrackerStatus,
    pub remarks: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewTracker {
    pub training_id: i64,
    pub kind: TrackerKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerFilter {
    pub kind: Option<TrackerKind>,
    pub status: Option<TrackerStatus>,
}

/// One cell of the kind x status count matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerCount {
    pub kind: TrackerKind,
    pub status: TrackerStatus,
    pub count: i64,
}

use internship_core_api::{completion_rate, OverallStatus, TrackerStatus};
use internship_core_db::models::TrackerModel;
use rust_decimal::Decimal;
use serde::Serialize;

/// Progress of one training's evaluations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub training_id: i64,
    pub trackers: Vec<TrackerModel>,
    /// Percentage of completed trackers, two decimal places.
    pub completion_rate: Decimal,
    pub overall_status: OverallStatus,
}

impl TrainingSummary {
    pub fn from_trackers(training_id: i64, trackers: Vec<TrackerModel>) -> Self {
        let statuses: Vec<TrackerStatus> = trackers.iter().map(|t| t.status).collect();
        Self {
            training_id,
            completion_rate: completion_rate(&statuses),
            overall_status: OverallStatus::derive(&statuses),
            trackers,
        }
    }
}

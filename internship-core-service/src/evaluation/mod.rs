//! Evaluation obligations of a training.
//!
//! Every training owns one tracker per [`TrackerKind`]. Trackers move
//! `pending -> in_progress` on assignment, to `overdue` when the sweep finds
//! them past due, and to `completed`, which is terminal.
//!
//! [`TrackerKind`]: internship_core_api::TrackerKind

mod queries;
mod summary;
mod tracker;

pub use summary::TrainingSummary;
pub use tracker::EvaluationTracker;

#[cfg(test)]
mod tests;

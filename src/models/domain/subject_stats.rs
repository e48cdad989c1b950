use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-subject projection over a user's result history. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, SimpleObject)]
pub struct SubjectStats {
    pub subject: String,
    pub attempts: u32,
    pub average_score: f64,
    pub best_score: f64,
    pub total_questions: u64,
}

/// One point of the performance-over-time series.
#[derive(Clone, Debug, PartialEq, Serialize, SimpleObject)]
pub struct ScorePoint {
    pub created_at: DateTime<Utc>,
    pub subject: String,
    pub percentage: f64,
}

impl SubjectStats {
    pub fn empty(subject: &str) -> Self {
        SubjectStats {
            subject: subject.to_string(),
            attempts: 0,
            average_score: 0.0,
            best_score: 0.0,
            total_questions: 0,
        }
    }
}

use std::collections::HashMap;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{QuizResult, ScorePoint, SubjectStats},
};

/// Folds results, in the order given, into per-subject statistics.
///
/// Subjects appear in the order they are first seen. The running average
/// uses the incremental mean `avg' = (avg * (n - 1) + pct) / n`, so its exact
/// value depends on input order; attempts and best score do not.
pub fn aggregate(results: &[QuizResult]) -> AppResult<Vec<SubjectStats>> {
    let mut stats: Vec<SubjectStats> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for result in results {
        let percentage = result.percentage().ok_or_else(|| {
            AppError::DivideByZero(format!("Quiz result '{}' has no questions", result.id))
        })?;

        let position = *positions.entry(result.subject.as_str()).or_insert_with(|| {
            stats.push(SubjectStats::empty(&result.subject));
            stats.len() - 1
        });
        let entry = &mut stats[position];

        entry.attempts += 1;
        entry.total_questions += u64::from(result.total_questions);
        let n = entry.attempts as f64;
        entry.average_score = (entry.average_score * (n - 1.0) + percentage) / n;
        if percentage > entry.best_score {
            entry.best_score = percentage;
        }
    }

    Ok(stats)
}

/// Percentage per result, oldest first, for the performance-over-time chart.
pub fn score_history(results: &[QuizResult]) -> Vec<ScorePoint> {
    let mut points: Vec<ScorePoint> = results
        .iter()
        .filter_map(|result| {
            result.percentage().map(|percentage| ScorePoint {
                created_at: result.created_at,
                subject: result.subject.clone(),
                percentage,
            })
        })
        .collect();
    points.sort_by_key(|point| point.created_at);
    points
}

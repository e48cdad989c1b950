use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{quiz_result::UNANSWERED, QuizResult, ScorePoint, SubjectStats},
        dto::response::DashboardResponse,
    },
    repositories::{QuizResultRepository, UserRepository},
    services::result_aggregator::{aggregate, score_history},
};

const RECENT_RESULTS: usize = 10;

pub struct QuizResultService {
    results: Arc<dyn QuizResultRepository>,
    users: Arc<dyn UserRepository>,
}

impl QuizResultService {
    pub fn new(results: Arc<dyn QuizResultRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { results, users }
    }

    /// Stores a finished result for `user_id` and returns its id.
    ///
    /// Degenerate results are refused here so the aggregator never sees them.
    pub async fn save_result(&self, user_id: Option<&str>, mut result: QuizResult) -> AppResult<String> {
        let user_id = user_id.ok_or_else(|| {
            AppError::Unauthorized("Sign in to save quiz results".to_string())
        })?;
        validate_result(&result)?;

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User '{}' not found", user_id)));
        }

        result.user_id = Some(user_id.to_string());
        let stored = self.results.create(result).await?;
        log::info!(
            "Saved quiz result {} for user {} ({}/{})",
            stored.id,
            user_id,
            stored.score,
            stored.total_questions
        );
        Ok(stored.id)
    }

    /// The user's results, newest first.
    pub async fn list_results(&self, user_id: &str) -> AppResult<Vec<QuizResult>> {
        let mut results = self.results.list_by_user(user_id).await?;
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    pub async fn get_result(&self, user_id: &str, id: &str) -> AppResult<QuizResult> {
        self.results
            .find_by_id(id)
            .await?
            .filter(|result| result.user_id.as_deref() == Some(user_id))
            .ok_or_else(|| AppError::NotFound(format!("Quiz result '{}' not found", id)))
    }

    /// Per-subject statistics, folded over the history in chronological order.
    pub async fn subject_stats(&self, user_id: &str) -> AppResult<Vec<SubjectStats>> {
        let chronological = self.chronological(user_id).await?;
        aggregate(&chronological)
    }

    pub async fn score_history(&self, user_id: &str) -> AppResult<Vec<ScorePoint>> {
        let results = self.list_results(user_id).await?;
        Ok(score_history(&results))
    }

    pub async fn dashboard(&self, user_id: &str) -> AppResult<DashboardResponse> {
        let mut chronological = self.chronological(user_id).await?;
        let subject_stats = aggregate(&chronological)?;
        let history = score_history(&chronological);

        chronological.reverse();
        chronological.truncate(RECENT_RESULTS);

        Ok(DashboardResponse {
            subject_stats,
            recent_results: chronological,
            score_history: history,
        })
    }

    async fn chronological(&self, user_id: &str) -> AppResult<Vec<QuizResult>> {
        let mut results = self.list_results(user_id).await?;
        results.reverse();
        Ok(results)
    }
}

pub fn validate_result(result: &QuizResult) -> AppResult<()> {
    if result.total_questions == 0 {
        return Err(AppError::ValidationError(
            "A quiz result must contain at least one question".to_string(),
        ));
    }
    if result.score > result.total_questions {
        return Err(AppError::ValidationError(format!(
            "Score {} exceeds total questions {}",
            result.score, result.total_questions
        )));
    }
    if result.questions.len() != result.total_questions as usize {
        return Err(AppError::ValidationError(format!(
            "Expected {} question outcomes but got {}",
            result.total_questions,
            result.questions.len()
        )));
    }
    for outcome in &result.questions {
        if outcome.selected_answer < UNANSWERED || outcome.correct_answer < 0 {
            return Err(AppError::ValidationError(format!(
                "Question '{}' has an invalid option index",
                outcome.question_id
            )));
        }
        if outcome.is_correct != (outcome.selected_answer == outcome.correct_answer) {
            return Err(AppError::ValidationError(format!(
                "Question '{}' is marked {} but option {} was chosen against answer {}",
                outcome.question_id,
                if outcome.is_correct { "correct" } else { "incorrect" },
                outcome.selected_answer,
                outcome.correct_answer
            )));
        }
    }
    let correct = result.questions.iter().filter(|q| q.is_correct).count() as u32;
    if correct != result.score {
        return Err(AppError::ValidationError(format!(
            "Score {} does not match {} correct outcomes",
            result.score, correct
        )));
    }
    Ok(())
}

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::domain::{ChatMessage, ExamType, QuestionOutcome, QuizResult};

pub const DEFAULT_QUESTION_COUNT: usize = 15;
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 900;

fn default_subjects() -> Vec<String> {
    vec!["Mathematics".to_string()]
}

fn default_question_count() -> usize {
    DEFAULT_QUESTION_COUNT
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SECS
}

fn no_blank_subjects(subjects: &[String]) -> Result<(), ValidationError> {
    if subjects.iter().any(|s| s.trim().is_empty()) {
        return Err(ValidationError::new("blank_subject"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[serde(default = "default_subjects")]
    #[validate(length(min = 1, max = 9), custom(function = "no_blank_subjects"))]
    pub subjects: Vec<String>,

    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = 200))]
    pub question_count: usize,

    #[serde(default = "default_time_limit")]
    #[validate(range(min = 30, max = 10800))]
    pub time_limit_secs: u32,

    #[serde(default)]
    pub exam_type: ExamType,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(range(max = 25))]
    pub option_index: usize,
}

/// A result computed by a client that ran the quiz itself.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveQuizResultRequest {
    #[validate(length(min = 1), custom(function = "no_blank_subjects"))]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub exam_type: ExamType,
    pub score: u32,
    pub total_questions: u32,
    pub time_spent: u32,
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
    #[validate(length(min = 1))]
    pub questions: Vec<QuestionOutcome>,
}

impl SaveQuizResultRequest {
    pub fn into_result(self) -> QuizResult {
        let mut result = QuizResult::new(
            self.subjects,
            self.exam_type,
            self.score,
            self.time_spent,
            self.time_limit,
            self.questions,
        );
        result.total_questions = self.total_questions;
        result
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[validate(length(max = 100))]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCallbackQuery {
    pub code: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

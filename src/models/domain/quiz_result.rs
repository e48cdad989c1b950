use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::question::{ExamType, Question};

/// Sentinel stored in `selected_answer` for a question the candidate never answered.
pub const UNANSWERED: i32 = -1;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct QuizResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub subjects: Vec<String>,
    /// Grouping key used by the dashboard; the subjects joined with ", ".
    pub subject: String,
    pub exam_type: ExamType,
    pub score: u32,
    pub total_questions: u32,
    pub time_spent: u32,
    pub time_limit: u32,
    pub questions: Vec<QuestionOutcome>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub subject: String,
    /// Question text as it was asked. Empty for results posted without it.
    #[serde(default)]
    pub question: String,
    pub selected_answer: i32,
    pub correct_answer: i32,
    pub is_correct: bool,
}

impl QuizResult {
    pub fn new(
        subjects: Vec<String>,
        exam_type: ExamType,
        score: u32,
        time_spent: u32,
        time_limit: u32,
        questions: Vec<QuestionOutcome>,
    ) -> Self {
        QuizResult {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            subject: subject_label(&subjects),
            subjects,
            exam_type,
            score,
            total_questions: questions.len() as u32,
            time_spent,
            time_limit,
            questions,
            created_at: Utc::now(),
        }
    }

    pub fn with_owner(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Percentage score, `None` for a result with no questions.
    pub fn percentage(&self) -> Option<f64> {
        if self.total_questions == 0 {
            return None;
        }
        Some(100.0 * self.score as f64 / self.total_questions as f64)
    }
}

impl QuestionOutcome {
    pub fn new(
        question_id: impl Into<String>,
        subject: impl Into<String>,
        selected: Option<usize>,
        correct_answer: usize,
    ) -> Self {
        let is_correct = selected == Some(correct_answer);
        QuestionOutcome {
            question_id: question_id.into(),
            subject: subject.into(),
            question: String::new(),
            selected_answer: selected.map(|s| s as i32).unwrap_or(UNANSWERED),
            correct_answer: correct_answer as i32,
            is_correct,
        }
    }

    /// Outcome for a drawn question, keeping its text for later review.
    pub fn from_question(question: &Question, selected: Option<usize>) -> Self {
        QuestionOutcome {
            question: question.question.clone(),
            ..Self::new(&question.id, &question.subject, selected, question.answer_index)
        }
    }
}

pub fn subject_label(subjects: &[String]) -> String {
    subjects.join(", ")
}

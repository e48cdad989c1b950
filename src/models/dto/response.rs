use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    ExamType, Question, QuizResult, QuizSession, ScorePoint, SessionStatus, SubjectStats, User,
};

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    #[graphql(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserDto,
}

/// What happened to a finished session's result on its way to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PersistenceStatus {
    /// The session has not finished yet.
    NotStarted,
    Pending,
    Saved { result_id: String },
    Failed { code: String, message: String },
}

/// The current question without its answer.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub subject: String,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        QuestionView {
            id: question.id.clone(),
            subject: question.subject.clone(),
            topic: question.topic.clone(),
            question: question.question.clone(),
            options: question.options.clone(),
            year: question.year,
        }
    }
}

/// Revealed once the current question has been answered.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerFeedback {
    pub selected_answer: usize,
    pub correct_answer: usize,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub status: SessionStatus,
    pub subjects: Vec<String>,
    pub exam_type: ExamType,
    pub current_index: usize,
    pub total_questions: usize,
    pub answered_count: usize,
    pub score: u32,
    pub remaining_secs: u32,
    pub time_limit_secs: u32,
    pub advance_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<AnswerFeedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<QuizResult>,
    pub persistence: PersistenceStatus,
}

impl SessionView {
    pub fn new(
        session: &QuizSession,
        result: Option<&QuizResult>,
        persistence: &PersistenceStatus,
    ) -> Self {
        let current = session.current_question();
        let feedback = current.zip(session.current_selection()).map(|(q, selected)| {
            AnswerFeedback {
                selected_answer: selected,
                correct_answer: q.answer_index,
                is_correct: q.is_correct(selected),
                explanation: q.explanation.clone(),
            }
        });

        SessionView {
            id: session.id.clone(),
            status: session.status,
            subjects: session.params.subjects.clone(),
            exam_type: session.params.exam_type,
            current_index: session.current_index,
            total_questions: session.total_questions(),
            answered_count: session.answered_count(),
            score: session.score,
            remaining_secs: session.remaining_secs,
            time_limit_secs: session.params.time_limit_secs,
            advance_pending: session.pending_advance.is_some(),
            current_question: current.map(QuestionView::from),
            feedback,
            result: result.cloned(),
            persistence: persistence.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResultResponse {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub subject_stats: Vec<SubjectStats>,
    pub recent_results: Vec<QuizResult>,
    pub score_history: Vec<ScorePoint>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

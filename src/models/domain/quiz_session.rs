use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::domain::{
    question::{ExamType, Question},
    quiz_result::{QuestionOutcome, QuizResult},
};

/// Parameters a session is drawn from; kept on the session so it can be reset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionParams {
    pub subjects: Vec<String>,
    pub question_count: usize,
    pub time_limit_secs: u32,
    pub exam_type: ExamType,
    pub user_id: Option<String>,
}

/// Handle for the delayed advance scheduled by an accepted answer.
///
/// Only the most recently issued token is honoured; any older token that
/// fires late is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AdvanceToken(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    QuestionsExhausted,
    TimeExpired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Terminal(FinishReason),
}

/// A timed practice quiz in progress.
///
/// The question sequence is fixed when the session is drawn. The session is
/// mutated only through [`submit_answer`](Self::submit_answer),
/// [`advance`](Self::advance), [`complete_pending_advance`](Self::complete_pending_advance)
/// and [`tick`](Self::tick); each of those returns the finished [`QuizResult`]
/// on the one call that moves the session into its terminal state.
#[derive(Clone, Debug, Serialize)]
pub struct QuizSession {
    pub id: String,
    pub params: SessionParams,
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub score: u32,
    pub selections: Vec<Option<usize>>,
    pub remaining_secs: u32,
    pub pending_advance: Option<AdvanceToken>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    frozen_elapsed: Option<u32>,
    issued_tokens: u64,
}

impl QuizSession {
    pub fn new(params: SessionParams, questions: Vec<Question>) -> Self {
        let selections = vec![None; questions.len()];
        QuizSession {
            id: Uuid::new_v4().to_string(),
            remaining_secs: params.time_limit_secs,
            params,
            questions,
            current_index: 0,
            score: 0,
            selections,
            pending_advance: None,
            status: SessionStatus::Running,
            started_at: Utc::now(),
            frozen_elapsed: None,
            issued_tokens: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, SessionStatus::Terminal(_))
    }

    /// A session drawn from an empty pool can never be played.
    pub fn is_startable(&self) -> bool {
        !self.questions.is_empty()
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.is_terminal() {
            return None;
        }
        self.questions.get(self.current_index)
    }

    pub fn current_selection(&self) -> Option<usize> {
        self.selections.get(self.current_index).copied().flatten()
    }

    pub fn answered_count(&self) -> usize {
        self.selections.iter().filter(|s| s.is_some()).count()
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.frozen_elapsed
            .unwrap_or_else(|| self.params.time_limit_secs.saturating_sub(self.remaining_secs))
    }

    /// Records an answer for the current question.
    ///
    /// Returns the token for the delayed advance, or `None` when the call is
    /// ignored: the session is terminal, has no current question, or the
    /// current question already has an answer.
    pub fn submit_answer(&mut self, option_index: usize) -> Option<AdvanceToken> {
        if self.is_terminal() {
            return None;
        }
        let question = self.questions.get(self.current_index)?;
        if self.selections[self.current_index].is_some() {
            return None;
        }

        if question.is_correct(option_index) {
            self.score += 1;
        }
        self.selections[self.current_index] = Some(option_index);

        if self.current_index + 1 == self.questions.len() {
            // Nothing is left to answer, so the clock no longer matters for the result.
            self.frozen_elapsed = Some(self.elapsed_secs());
        }

        self.issued_tokens += 1;
        let token = AdvanceToken(self.issued_tokens);
        self.pending_advance = Some(token);
        Some(token)
    }

    /// Moves to the next question, or finishes the session after the last one.
    pub fn advance(&mut self) -> Option<QuizResult> {
        if self.is_terminal() {
            return None;
        }
        self.pending_advance = None;

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            None
        } else {
            Some(self.finalize(FinishReason::QuestionsExhausted))
        }
    }

    /// Runs the delayed advance for `token` if it is still the pending one.
    pub fn complete_pending_advance(&mut self, token: AdvanceToken) -> Option<QuizResult> {
        if self.pending_advance != Some(token) {
            return None;
        }
        self.advance()
    }

    /// Consumes one second of the time limit; running out finishes the session.
    pub fn tick(&mut self) -> Option<QuizResult> {
        if self.is_terminal() {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.finalize(FinishReason::TimeExpired));
        }
        None
    }

    /// Builds the result payload from the current state without changing it.
    pub fn to_result(&self) -> QuizResult {
        let outcomes = self
            .questions
            .iter()
            .zip(&self.selections)
            .map(|(question, selected)| QuestionOutcome::from_question(question, *selected))
            .collect();

        let result = QuizResult::new(
            self.params.subjects.clone(),
            self.params.exam_type,
            self.score,
            self.elapsed_secs(),
            self.params.time_limit_secs,
            outcomes,
        );

        match &self.params.user_id {
            Some(user_id) => result.with_owner(user_id.clone()),
            None => result,
        }
    }

    fn finalize(&mut self, reason: FinishReason) -> QuizResult {
        self.status = SessionStatus::Terminal(reason);
        self.pending_advance = None;
        self.to_result()
    }
}

use std::sync::Arc;

use rand::Rng;

use crate::{
    catalog::QuestionStore,
    models::domain::{QuizSession, SessionParams},
    services::sampling::{distinct_subjects, question_pool, sample_questions},
};

/// Draws practice sessions from an injected question catalog.
#[derive(Clone)]
pub struct QuizEngine {
    store: Arc<QuestionStore>,
}

impl QuizEngine {
    pub fn new(store: Arc<QuestionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn start(&self, params: SessionParams) -> QuizSession {
        self.start_with_rng(params, &mut rand::thread_rng())
    }

    /// Pools every question of the requested subjects and samples
    /// `min(count, pool)` of them. An empty pool gives a session with no
    /// questions, which callers must refuse to run.
    pub fn start_with_rng<R>(&self, params: SessionParams, rng: &mut R) -> QuizSession
    where
        R: Rng + ?Sized,
    {
        let subjects = distinct_subjects(&params.subjects);
        let pool = question_pool(&self.store, &subjects);
        let questions = sample_questions(&pool, params.question_count, rng);

        log::debug!(
            "Drew {} of {} questions for subjects {:?}",
            questions.len(),
            pool.len(),
            subjects
        );

        QuizSession::new(SessionParams { subjects, ..params }, questions)
    }

    /// A fresh draw with the same parameters and owner.
    pub fn reset(&self, session: &QuizSession) -> QuizSession {
        self.start(session.params.clone())
    }
}

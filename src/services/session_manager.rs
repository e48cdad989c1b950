use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use validator::Validate;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::{
        domain::{AdvanceToken, QuizResult, QuizSession, SessionParams},
        dto::{
            request::StartSessionRequest,
            response::{PersistenceStatus, SessionView},
        },
    },
    services::{
        quiz_engine::QuizEngine, quiz_result_service::QuizResultService,
        sampling::distinct_subjects,
    },
};

struct SessionState {
    session: QuizSession,
    result: Option<QuizResult>,
    persistence: PersistenceStatus,
    ticker: Option<JoinHandle<()>>,
    advance: Option<JoinHandle<()>>,
}

impl SessionState {
    fn view(&self) -> SessionView {
        SessionView::new(&self.session, self.result.as_ref(), &self.persistence)
    }

    fn abort_advance(&mut self) {
        if let Some(handle) = self.advance.take() {
            handle.abort();
        }
    }

    fn abort_timers(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        self.abort_advance();
    }
}

struct LiveSession {
    state: Mutex<SessionState>,
}

type SessionMap = RwLock<HashMap<String, Arc<LiveSession>>>;

/// What the background tasks of a session need from the manager.
struct Runtime {
    results: Arc<QuizResultService>,
    sessions: SessionMap,
    retention: Duration,
}

impl LiveSession {
    fn new(session: QuizSession) -> Arc<Self> {
        Arc::new(LiveSession {
            state: Mutex::new(SessionState {
                session,
                result: None,
                persistence: PersistenceStatus::NotStarted,
                ticker: None,
                advance: None,
            }),
        })
    }

    /// Records the terminal result, stops both timers, hands the result to
    /// storage and schedules the session's removal after the retention window.
    fn finish(self: &Arc<Self>, state: &mut SessionState, result: QuizResult, runtime: &Arc<Runtime>) {
        state.abort_timers();
        log::info!(
            "Session {} finished with {}/{} in {}s",
            state.session.id,
            result.score,
            result.total_questions,
            result.time_spent
        );
        state.result = Some(result.clone());
        state.persistence = PersistenceStatus::Pending;

        tokio::spawn(persist(self.clone(), runtime.results.clone(), result));
        tokio::spawn(evict(runtime.clone(), state.session.id.clone(), runtime.retention));
    }
}

async fn evict(runtime: Arc<Runtime>, id: String, after: Duration) {
    time::sleep(after).await;
    if runtime.sessions.write().await.remove(&id).is_some() {
        log::debug!("Session {} evicted after {}s", id, after.as_secs());
    }
}

async fn persist(live: Arc<LiveSession>, results: Arc<QuizResultService>, result: QuizResult) {
    let owner = result.user_id.clone();
    let status = match results.save_result(owner.as_deref(), result).await {
        Ok(result_id) => PersistenceStatus::Saved { result_id },
        Err(AppError::Unauthorized(message)) => {
            log::info!("Not saving anonymous session result: {}", message);
            PersistenceStatus::Failed {
                code: "UNAUTHORIZED".to_string(),
                message,
            }
        }
        Err(e) => {
            log::error!("Failed to save quiz result: {}", e);
            PersistenceStatus::Failed {
                code: e.error_code().to_string(),
                message: e.to_string(),
            }
        }
    };

    live.state.lock().await.persistence = status;
}

async fn run_ticker(live: Arc<LiveSession>, runtime: Arc<Runtime>, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let mut state = live.state.lock().await;
        if state.session.is_terminal() {
            break;
        }
        if let Some(result) = state.session.tick() {
            log::info!("Session {} ran out of time", state.session.id);
            live.finish(&mut state, result, &runtime);
            break;
        }
    }
}

async fn run_advance(
    live: Arc<LiveSession>,
    runtime: Arc<Runtime>,
    token: AdvanceToken,
    delay: Duration,
) {
    time::sleep(delay).await;
    let mut state = live.state.lock().await;
    if let Some(result) = state.session.complete_pending_advance(token) {
        live.finish(&mut state, result, &runtime);
    }
}

/// Owns every running session and the timers that drive them.
///
/// The map lock is never held while waiting on a session lock. Finished
/// sessions stay readable for the retention window, then are dropped.
pub struct SessionManager {
    engine: QuizEngine,
    runtime: Arc<Runtime>,
    timings: SessionTimings,
}

#[derive(Clone, Copy, Debug)]
pub struct SessionTimings {
    pub tick_interval: Duration,
    pub advance_delay: Duration,
    pub retention: Duration,
}

impl SessionManager {
    pub fn new(engine: QuizEngine, results: Arc<QuizResultService>, timings: SessionTimings) -> Self {
        Self {
            engine,
            runtime: Arc::new(Runtime {
                results,
                sessions: RwLock::new(HashMap::new()),
                retention: timings.retention,
            }),
            timings,
        }
    }

    pub fn from_config(engine: QuizEngine, results: Arc<QuizResultService>, config: &Config) -> Self {
        Self::new(
            engine,
            results,
            SessionTimings {
                tick_interval: config.quiz_tick_interval(),
                advance_delay: config.quiz_advance_delay(),
                retention: config.quiz_session_retention(),
            },
        )
    }

    pub async fn start(
        &self,
        owner: Option<String>,
        request: StartSessionRequest,
    ) -> AppResult<SessionView> {
        request.validate()?;

        let subjects = distinct_subjects(&request.subjects);
        if let Some(max) = request.exam_type.max_subjects() {
            if subjects.len() > max {
                return Err(AppError::ValidationError(format!(
                    "{} allows at most {} subjects, got {}",
                    request.exam_type,
                    max,
                    subjects.len()
                )));
            }
        }

        let session = self.engine.start(SessionParams {
            subjects,
            question_count: request.question_count,
            time_limit_secs: request.time_limit_secs,
            exam_type: request.exam_type,
            user_id: owner,
        });
        if !session.is_startable() {
            let catalog = self.engine.store();
            let unknown: Vec<&str> = session
                .params
                .subjects
                .iter()
                .map(String::as_str)
                .filter(|subject| !catalog.contains_subject(subject))
                .collect();
            let message = if unknown.is_empty() {
                format!("No questions available for {}", session.params.subjects.join(", "))
            } else {
                format!("Unknown subjects: {}", unknown.join(", "))
            };
            return Err(AppError::ValidationError(message));
        }

        log::info!(
            "Started session {} with {} questions from {:?}",
            session.id,
            session.total_questions(),
            session.params.subjects
        );
        Ok(self.launch(session).await)
    }

    pub async fn get(&self, id: &str, caller: Option<&str>) -> AppResult<SessionView> {
        let live = self.find(id).await?;
        let state = live.state.lock().await;
        authorize(&state.session, caller)?;
        Ok(state.view())
    }

    /// Answers the current question and schedules the delayed advance.
    ///
    /// Repeated answers and answers to a finished session leave it unchanged.
    pub async fn answer(
        &self,
        id: &str,
        caller: Option<&str>,
        option_index: usize,
    ) -> AppResult<SessionView> {
        let live = self.find(id).await?;
        let mut state = live.state.lock().await;
        authorize(&state.session, caller)?;

        if let Some(question) = state.session.current_question() {
            if option_index >= question.options.len() {
                return Err(AppError::ValidationError(format!(
                    "Option {} is out of range for a question with {} options",
                    option_index,
                    question.options.len()
                )));
            }
        }

        if let Some(token) = state.session.submit_answer(option_index) {
            state.abort_advance();
            state.advance = Some(tokio::spawn(run_advance(
                live.clone(),
                self.runtime.clone(),
                token,
                self.timings.advance_delay,
            )));
        }
        Ok(state.view())
    }

    /// Moves on without waiting for the delayed advance.
    pub async fn advance(&self, id: &str, caller: Option<&str>) -> AppResult<SessionView> {
        let live = self.find(id).await?;
        let mut state = live.state.lock().await;
        authorize(&state.session, caller)?;

        state.abort_advance();
        if let Some(result) = state.session.advance() {
            live.finish(&mut state, result, &self.runtime);
        }
        Ok(state.view())
    }

    /// Replaces the session with a fresh draw of the same parameters.
    ///
    /// The old session keeps running when no fresh draw is possible.
    pub async fn reset(&self, id: &str, caller: Option<&str>) -> AppResult<SessionView> {
        let live = self.find(id).await?;
        let fresh = {
            let mut state = live.state.lock().await;
            authorize(&state.session, caller)?;
            let fresh = self.engine.reset(&state.session);
            if !fresh.is_startable() {
                return Err(AppError::ValidationError(
                    "No questions available to restart this session".to_string(),
                ));
            }
            state.abort_timers();
            fresh
        };

        self.runtime.sessions.write().await.remove(id);
        log::info!("Session {} reset as {}", id, fresh.id);
        Ok(self.launch(fresh).await)
    }

    pub async fn abandon(&self, id: &str, caller: Option<&str>) -> AppResult<()> {
        let live = self.find(id).await?;
        let mut state = live.state.lock().await;
        authorize(&state.session, caller)?;
        state.abort_timers();
        drop(state);

        self.runtime.sessions.write().await.remove(id);
        log::info!("Session {} abandoned", id);
        Ok(())
    }

    pub async fn active_sessions(&self) -> usize {
        self.runtime.sessions.read().await.len()
    }

    async fn launch(&self, session: QuizSession) -> SessionView {
        let id = session.id.clone();
        let live = LiveSession::new(session);

        let view = {
            let mut state = live.state.lock().await;
            state.ticker = Some(tokio::spawn(run_ticker(
                live.clone(),
                self.runtime.clone(),
                self.timings.tick_interval,
            )));
            state.view()
        };

        self.runtime.sessions.write().await.insert(id, live);
        view
    }

    async fn find(&self, id: &str) -> AppResult<Arc<LiveSession>> {
        self.runtime
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session '{}' not found", id)))
    }
}

/// Owned sessions are private to their owner; anonymous sessions are open to
/// whoever holds the id.
fn authorize(session: &QuizSession, caller: Option<&str>) -> AppResult<()> {
    match session.params.user_id.as_deref() {
        Some(owner) if caller != Some(owner) => Err(AppError::Unauthorized(
            "This session belongs to another user".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::{ExamType, FinishReason, SessionStatus, User},
        repositories::{
            quiz_result_repository::MockQuizResultRepository, user_repository::MockUserRepository,
        },
        catalog::QuestionStore,
        test_utils::fixtures::{question, question_store},
    };

    const TICK: Duration = Duration::from_secs(1);
    const DELAY: Duration = Duration::from_secs(3);
    const RETENTION: Duration = Duration::from_secs(600);

    fn manager_with(results: MockQuizResultRepository, users: MockUserRepository) -> SessionManager {
        let service = QuizResultService::new(Arc::new(results), Arc::new(users));
        SessionManager::new(
            QuizEngine::new(Arc::new(question_store())),
            Arc::new(service),
            SessionTimings {
                tick_interval: TICK,
                advance_delay: DELAY,
                retention: RETENTION,
            },
        )
    }

    fn manager() -> SessionManager {
        manager_with(MockQuizResultRepository::new(), MockUserRepository::new())
    }

    fn saving_manager() -> SessionManager {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(User { id: id.to_string(), ..User::test_user_simple("tobi") })));
        let mut results = MockQuizResultRepository::new();
        results.expect_create().times(1).returning(|r: QuizResult| Ok(r));
        manager_with(results, users)
    }

    fn request(subjects: &[&str], count: usize, time_limit_secs: u32) -> StartSessionRequest {
        StartSessionRequest {
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            question_count: count,
            time_limit_secs,
            exam_type: ExamType::Utme,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_rejects_unknown_subjects() {
        let err = manager()
            .start(None, request(&["Astrology"], 5, 600))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("Astrology")));
    }

    #[tokio::test(start_paused = true)]
    async fn utme_accepts_at_most_four_subjects() {
        let subjects = ["Mathematics", "Economics", "English Language", "Physics", "Biology"];

        let err = manager()
            .start(None, request(&subjects, 5, 600))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("at most 4")));
    }

    #[tokio::test(start_paused = true)]
    async fn more_questions_than_available_gives_whole_pool() {
        let view = manager()
            .start(None, request(&["Economics"], 15, 600))
            .await
            .expect("started");

        assert_eq!(view.total_questions, 3);
        assert_eq!(view.status, SessionStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn answer_advances_after_delay() {
        let manager = manager();
        let view = manager
            .start(None, request(&["Mathematics"], 3, 600))
            .await
            .expect("started");

        let answered = manager.answer(&view.id, None, 0).await.expect("answered");
        assert!(answered.advance_pending);
        assert_eq!(answered.current_index, 0);

        time::sleep(DELAY + Duration::from_millis(10)).await;

        let later = manager.get(&view.id, None).await.expect("session");
        assert_eq!(later.current_index, 1);
        assert!(!later.advance_pending);
        assert!(later.feedback.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn second_answer_to_same_question_is_ignored() {
        let manager = manager();
        let view = manager
            .start(None, request(&["Mathematics"], 2, 600))
            .await
            .expect("started");

        let first = manager.answer(&view.id, None, 0).await.expect("answered");
        let second = manager.answer(&view.id, None, 1).await.expect("ignored");

        assert_eq!(first.score, second.score);
        assert_eq!(second.answered_count, 1);
        assert_eq!(second.feedback.map(|f| f.selected_answer), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_option_is_rejected() {
        let manager = manager();
        let view = manager
            .start(None, request(&["Mathematics"], 2, 600))
            .await
            .expect("started");

        let err = manager.answer(&view.id, None, 9).await.unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        let unchanged = manager.get(&view.id, None).await.expect("session");
        assert_eq!(unchanged.answered_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_advance_cancels_pending_advance() {
        let manager = manager();
        let view = manager
            .start(None, request(&["Mathematics"], 3, 600))
            .await
            .expect("started");

        manager.answer(&view.id, None, 0).await.expect("answered");
        let advanced = manager.advance(&view.id, None).await.expect("advanced");
        assert_eq!(advanced.current_index, 1);

        time::sleep(DELAY * 2).await;

        let later = manager.get(&view.id, None).await.expect("session");
        assert_eq!(later.current_index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_without_answers_scores_nothing() {
        let manager = manager();
        let view = manager
            .start(None, request(&["Economics"], 3, 30))
            .await
            .expect("started");

        time::sleep(Duration::from_secs(31)).await;

        let finished = manager.get(&view.id, None).await.expect("session");
        assert_eq!(finished.status, SessionStatus::Terminal(FinishReason::TimeExpired));
        assert_eq!(finished.remaining_secs, 0);

        let result = finished.result.expect("terminal session carries its result");
        assert_eq!(result.score, 0);
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.time_spent, 30);
        assert_eq!(result.time_limit, 30);
        assert!(result
            .questions
            .iter()
            .all(|q| q.selected_answer == -1 && !q.is_correct));
        assert!(matches!(
            finished.persistence,
            PersistenceStatus::Failed { ref code, .. } if code == "UNAUTHORIZED"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn finishing_an_owned_session_saves_the_result_once() {
        let manager = saving_manager();
        let owner = Some("user-1");
        let view = manager
            .start(owner.map(str::to_string), request(&["Economics"], 2, 600))
            .await
            .expect("started");

        for _ in 0..2 {
            manager.answer(&view.id, owner, 0).await.expect("answered");
            manager.advance(&view.id, owner).await.expect("advanced");
        }
        time::sleep(Duration::from_millis(10)).await;

        let finished = manager.get(&view.id, owner).await.expect("session");
        let result = finished.result.expect("result");
        assert_eq!(
            finished.status,
            SessionStatus::Terminal(FinishReason::QuestionsExhausted)
        );
        assert_eq!(finished.persistence, PersistenceStatus::Saved { result_id: result.id });

        // the ticker is gone, so nothing changes afterwards
        time::sleep(Duration::from_secs(300)).await;
        let later = manager.get(&view.id, owner).await.expect("session");
        assert_eq!(later.remaining_secs, finished.remaining_secs);
    }

    #[tokio::test(start_paused = true)]
    async fn owned_sessions_are_private() {
        let manager = manager();
        let view = manager
            .start(Some("user-1".to_string()), request(&["Economics"], 2, 600))
            .await
            .expect("started");

        let err = manager.get(&view.id, Some("user-2")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = manager.answer(&view.id, None, 0).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_session_is_not_found() {
        let err = manager().get("missing", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_replaces_session_with_fresh_draw() {
        let manager = manager();
        let view = manager
            .start(None, request(&["Mathematics"], 2, 600))
            .await
            .expect("started");
        manager.answer(&view.id, None, 0).await.expect("answered");
        time::sleep(Duration::from_secs(5)).await;

        let fresh = manager.reset(&view.id, None).await.expect("reset");

        assert_ne!(fresh.id, view.id);
        assert_eq!(fresh.total_questions, 2);
        assert_eq!(fresh.score, 0);
        assert_eq!(fresh.answered_count, 0);
        assert_eq!(fresh.remaining_secs, 600);
        assert!(matches!(
            manager.get(&view.id, None).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(manager.active_sessions().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_removes_session() {
        let manager = manager();
        let view = manager
            .start(None, request(&["Mathematics"], 2, 600))
            .await
            .expect("started");

        manager.abandon(&view.id, None).await.expect("abandoned");

        assert_eq!(manager.active_sessions().await, 0);
        assert!(matches!(
            manager.abandon(&view.id, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_sessions_are_evicted_after_retention() {
        let manager = manager();
        for _ in 0..20 {
            manager
                .start(None, request(&["Economics"], 3, 30))
                .await
                .expect("started");
        }
        let running = manager
            .start(None, request(&["Mathematics"], 2, 3600))
            .await
            .expect("started");

        time::sleep(Duration::from_secs(31)).await;
        assert_eq!(manager.active_sessions().await, 21);

        time::sleep(RETENTION).await;
        assert_eq!(manager.active_sessions().await, 1);
        assert!(manager.get(&running.id, None).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn finished_session_stays_readable_within_retention() {
        let manager = manager();
        let view = manager
            .start(None, request(&["Economics"], 1, 30))
            .await
            .expect("started");
        manager.advance(&view.id, None).await.expect("finished");

        time::sleep(RETENTION - Duration::from_secs(1)).await;
        assert!(manager.get(&view.id, None).await.is_ok());

        time::sleep(Duration::from_secs(2)).await;
        assert!(matches!(
            manager.get(&view.id, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reset_leaves_old_session_running() {
        let manager = manager();
        let elsewhere = QuizEngine::new(Arc::new(
            QuestionStore::from_questions(vec![question("phy-1", "Physics", 0)])
                .expect("valid store"),
        ));
        let session = elsewhere.start(SessionParams {
            subjects: vec!["Physics".to_string()],
            question_count: 1,
            time_limit_secs: 600,
            exam_type: ExamType::Utme,
            user_id: None,
        });
        let id = manager.launch(session).await.id;

        let err = manager.reset(&id, None).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        time::sleep(Duration::from_secs(5) + Duration::from_millis(10)).await;
        let still_running = manager.get(&id, None).await.expect("old session kept");
        assert_eq!(still_running.status, SessionStatus::Running);
        assert_eq!(still_running.remaining_secs, 595);
    }
}

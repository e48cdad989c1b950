#[cfg(test)]
pub mod fixtures {
    use crate::{
        catalog::QuestionStore,
        models::domain::{
            Difficulty, ExamType, Question, QuestionOutcome, QuizResult, User,
        },
    };

    /// A four-option question whose correct option is `answer_index`.
    pub fn question(id: &str, subject: &str, answer_index: usize) -> Question {
        Question {
            id: id.to_string(),
            subject: subject.to_string(),
            topic: "General".to_string(),
            exam_type: ExamType::Utme,
            difficulty: Difficulty::Medium,
            question: format!("Question {}?", id),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer_index,
            explanation: Some(format!("Explanation for {}", id)),
            year: None,
        }
    }

    /// Mathematics 5, Economics 3, English Language 2.
    pub fn question_store() -> QuestionStore {
        let mut questions = Vec::new();
        for i in 0..5 {
            questions.push(question(&format!("math-{}", i), "Mathematics", i % 4));
        }
        for i in 0..3 {
            questions.push(question(&format!("eco-{}", i), "Economics", (i + 1) % 4));
        }
        for i in 0..2 {
            questions.push(question(&format!("eng-{}", i), "English Language", 3 - i));
        }
        QuestionStore::from_questions(questions).expect("fixture questions are valid")
    }

    /// A result for `subject` with `score` correct out of `total` questions.
    pub fn result_with_score(subject: &str, score: u32, total: u32) -> QuizResult {
        let outcomes = (0..total)
            .map(|i| {
                let selected = if i < score { 0 } else { 1 };
                QuestionOutcome::new(&format!("{}-{}", subject, i), subject, Some(selected), 0)
            })
            .collect();

        QuizResult::new(vec![subject.to_string()], ExamType::Utme, score, 60, 900, outcomes)
    }

    pub fn test_user() -> User {
        User::test_user_simple("testuser")
    }
}

#[cfg(test)]
pub mod in_memory {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use crate::{
        errors::{AppError, AppResult},
        models::domain::{ChatPrompt, QuizResult, User},
        repositories::{QuizResultRepository, UserRepository},
        services::chat_service::GenerativeClient,
    };

    #[derive(Default)]
    pub struct InMemoryUserRepository {
        users: RwLock<HashMap<String, User>>,
    }

    impl InMemoryUserRepository {
        pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
            Self {
                users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
            }
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
            Ok(self.users.read().await.get(id).cloned())
        }

        async fn find_by_github_id(&self, github_id: &str) -> AppResult<Option<User>> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| u.github_id.as_deref() == Some(github_id))
                .cloned())
        }

        async fn upsert_by_github_id(&self, mut user: User) -> AppResult<User> {
            let github_id = user.github_id.clone().ok_or_else(|| {
                AppError::ValidationError("User must have a github_id for upsert".to_string())
            })?;
            if let Some(existing) = self.find_by_github_id(&github_id).await? {
                user.id = existing.id;
                user.created_at = existing.created_at;
            }
            self.users.write().await.insert(user.id.clone(), user.clone());
            Ok(user)
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct InMemoryQuizResultRepository {
        results: RwLock<Vec<QuizResult>>,
    }

    #[async_trait]
    impl QuizResultRepository for InMemoryQuizResultRepository {
        async fn create(&self, result: QuizResult) -> AppResult<QuizResult> {
            let mut results = self.results.write().await;
            if results.iter().any(|r| r.id == result.id) {
                return Err(AppError::AlreadyExists(format!("Quiz result '{}'", result.id)));
            }
            results.push(result.clone());
            Ok(result)
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizResult>> {
            Ok(self.results.read().await.iter().find(|r| r.id == id).cloned())
        }

        async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<QuizResult>> {
            let mut owned: Vec<QuizResult> = self
                .results
                .read()
                .await
                .iter()
                .filter(|r| r.user_id.as_deref() == Some(user_id))
                .cloned()
                .collect();
            owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(owned)
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }

    /// Tutor backend that echoes the prompt back.
    pub struct EchoClient;

    #[async_trait]
    impl GenerativeClient for EchoClient {
        async fn send(&self, prompt: &ChatPrompt) -> AppResult<String> {
            Ok(format!("[{}] {}", prompt.subject, prompt.message))
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Arc;

    use actix_web::http::StatusCode;

    use super::{fixtures, in_memory};
    use crate::{app_state::AppState, config::Config, models::domain::User};

    /// Application state over in-memory storage, the fixture catalog and the echo tutor.
    pub fn test_state(users: Vec<User>) -> AppState {
        AppState::assemble(
            Config::test_config(),
            None,
            fixtures::question_store(),
            Arc::new(in_memory::InMemoryUserRepository::with_users(users)),
            Arc::new(in_memory::InMemoryQuizResultRepository::default()),
            Arc::new(in_memory::EchoClient),
        )
    }

    pub fn bearer(state: &AppState, user: &User) -> String {
        let token = state
            .jwt_service
            .create_token(user)
            .expect("token for test user");
        format!("Bearer {}", token)
    }

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::services::quiz_result_service::validate_result;

    #[test]
    fn test_fixture_store_sizes() {
        let store = question_store();
        assert_eq!(store.questions("Mathematics").len(), 5);
        assert_eq!(store.questions("Economics").len(), 3);
        assert_eq!(store.questions("English Language").len(), 2);
    }

    #[test]
    fn test_fixture_results_are_consistent() {
        let result = result_with_score("Physics", 3, 5);
        assert_eq!(result.total_questions, 5);
        assert!(validate_result(&result).is_ok());
    }

    #[test]
    fn test_fixtures_test_user() {
        let user = test_user();
        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "testuser@example.com");
    }
}

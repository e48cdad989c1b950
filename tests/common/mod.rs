#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use exam_prep_server::{
    app_state::AppState,
    catalog::QuestionStore,
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{ChatPrompt, QuizResult, User},
    repositories::{QuizResultRepository, UserRepository},
    services::chat_service::GenerativeClient,
};
use tokio::sync::RwLock;

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

/// Tutor stub that counts calls and echoes the prompt.
#[derive(Default)]
pub struct CountingClient {
    pub calls: AtomicUsize,
}

#[async_trait]
impl GenerativeClient for CountingClient {
    async fn send(&self, prompt: &ChatPrompt) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("About {}: {}", prompt.subject, prompt.message))
    }
}

pub fn test_app_state(users: Vec<User>, client: Arc<CountingClient>) -> AppState {
    AppState::assemble(
        Config::from_env(),
        None,
        QuestionStore::bundled().expect("bundled questions load"),
        Arc::new(InMemoryUserRepository::with_users(users)),
        Arc::new(InMemoryQuizResultRepository::default()),
        client,
    )
}

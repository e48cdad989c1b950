use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::User,
    repositories::UserRepository,
};

/// Profile fields taken from the identity provider after a successful login.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub provider_id: String,
    pub login: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Creates the user on first login and refreshes the profile afterwards.
    pub async fn upsert_oauth_user(&self, profile: OAuthProfile) -> AppResult<User> {
        if profile.provider_id.trim().is_empty() || profile.login.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Identity provider returned an incomplete profile".to_string(),
            ));
        }

        let email = profile
            .email
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| format!("{}@users.noreply.github.com", profile.login));

        let user = User::from_github(profile.provider_id, profile.login, email, profile.name);
        let stored = self.repository.upsert_by_github_id(user).await?;
        log::info!("Signed in user {} ({})", stored.username, stored.id);
        Ok(stored)
    }

    pub async fn get_user(&self, id: &str) -> AppResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_id: Option<String>,
    pub username: String,
    pub display_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: &str, display_name: &str, email: &str) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            github_id: None,
            username: username.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            created_at: Some(Utc::now()),
        }
    }

    /// Builds a user from a GitHub profile; the display name falls back to the login.
    pub fn from_github(github_id: String, login: String, email: String, name: Option<String>) -> Self {
        let display_name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| login.clone());

        User {
            id: Uuid::new_v4().to_string(),
            github_id: Some(github_id),
            username: login,
            display_name,
            email,
            created_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
impl User {
    pub fn test_user_simple(username: &str) -> Self {
        User::new(username, "Test User", &format!("{}@example.com", username))
    }
}

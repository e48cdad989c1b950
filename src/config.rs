use std::{env, time::Duration};

use secrecy::SecretString;

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";
const DEFAULT_GH_CLIENT_SECRET: &str = "gh_client_secret";
const DEFAULT_GH_CLIENT_ID: &str = "gh_client_id";

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub gh_client_id: String,
    pub gh_client_secret: SecretString,
    pub gh_redirect_uri: String,
    pub users_collection: String,
    pub results_collection: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub cors_allowed_origin: String,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub jwt_refresh_expiration_hours: i64,
    pub gemini_api_key: Option<SecretString>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub question_import_dir: Option<String>,
    pub quiz_tick_millis: u64,
    pub quiz_advance_delay_millis: u64,
    pub quiz_session_retention_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "exam-prep-local".to_string()),
            gh_client_id: env::var("GH_CLIENT_ID").unwrap_or_else(|_| DEFAULT_GH_CLIENT_ID.to_string()),
            gh_client_secret: SecretString::from(
                env::var("GH_CLIENT_SECRET").unwrap_or_else(|_| DEFAULT_GH_CLIENT_SECRET.to_string()),
            ),
            gh_redirect_uri: env::var("GH_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:3000/auth/callback".to_string()),
            users_collection: env::var("USERS_COLLECTION").unwrap_or_else(|_| "users".to_string()),
            results_collection: env::var("RESULTS_COLLECTION")
                .unwrap_or_else(|_| "quiz_results".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parse_env("WEB_SERVER_PORT").unwrap_or(8080),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: parse_env("JWT_EXPIRATION_HOURS").unwrap_or(24),
            jwt_refresh_expiration_hours: parse_env("JWT_REFRESH_EXPIRATION_HOURS").unwrap_or(168),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            question_import_dir: env::var("QUESTION_IMPORT_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty()),
            quiz_tick_millis: parse_env("QUIZ_TICK_MILLIS").unwrap_or(1000),
            quiz_advance_delay_millis: parse_env("QUIZ_ADVANCE_DELAY_MILLIS").unwrap_or(3000),
            quiz_session_retention_secs: parse_env("QUIZ_SESSION_RETENTION_SECS").unwrap_or(600),
        }
    }

    pub fn quiz_tick_interval(&self) -> Duration {
        Duration::from_millis(self.quiz_tick_millis.max(1))
    }

    pub fn quiz_advance_delay(&self) -> Duration {
        Duration::from_millis(self.quiz_advance_delay_millis)
    }

    /// How long a finished session stays readable before it is dropped.
    pub fn quiz_session_retention(&self) -> Duration {
        Duration::from_secs(self.quiz_session_retention_secs)
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();
        let gh_secret = self.gh_client_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }

        if gh_secret == DEFAULT_GH_CLIENT_SECRET {
            panic!(
                "FATAL: GH_CLIENT_SECRET is using default value! Set GH_CLIENT_SECRET environment variable."
            );
        }

        if self.gh_client_id == DEFAULT_GH_CLIENT_ID {
            panic!(
                "FATAL: GH_CLIENT_ID is using default value! Set GH_CLIENT_ID environment variable."
            );
        }

        if self.gemini_api_key.is_none() {
            log::warn!("GEMINI_API_KEY is not set; the AI tutor will answer with an upstream error");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "exam-prep-test".to_string(),
            gh_client_id: "id string".to_string(),
            gh_client_secret: SecretString::from("secret string".to_string()),
            gh_redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            users_collection: "users".to_string(),
            results_collection: "quiz_results".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            jwt_refresh_expiration_hours: 168,
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_base_url: "http://localhost:9/v1beta".to_string(),
            question_import_dir: None,
            quiz_tick_millis: 1000,
            quiz_advance_delay_millis: 3000,
            quiz_session_retention_secs: 600,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        // Should use env vars if set, or fall back to defaults
        assert!(!config.mongo_conn_string.is_empty());
        assert!(!config.mongo_db_name.is_empty());
        assert!(!config.gemini_model.is_empty());
        assert!(config.quiz_tick_millis > 0);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.mongo_db_name, "exam-prep-test");
        assert_eq!(config.results_collection, "quiz_results");
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_quiz_timing_durations() {
        let config = Config::test_config();

        assert_eq!(config.quiz_tick_interval(), Duration::from_secs(1));
        assert_eq!(config.quiz_advance_delay(), Duration::from_secs(3));
        assert_eq!(config.quiz_session_retention(), Duration::from_secs(600));
    }

    #[test]
    #[should_panic(expected = "JWT_SECRET is using default value")]
    fn test_validate_for_production_rejects_default_secret() {
        let mut config = Config::test_config();
        config.jwt_secret = SecretString::from(DEFAULT_JWT_SECRET.to_string());
        config.validate_for_production();
    }
}

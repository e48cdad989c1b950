use std::{path::Path, sync::Arc};

use crate::{
    auth::JwtService,
    catalog::QuestionStore,
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        MongoQuizResultRepository, MongoUserRepository, QuizResultRepository, UserRepository,
    },
    services::{
        chat_service::{ChatService, GenerativeClient},
        gemini_client::GeminiClient,
        quiz_engine::QuizEngine,
        quiz_result_service::QuizResultService,
        session_manager::SessionManager,
        user_service::UserService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Absent when the state is assembled without MongoDB.
    pub db: Option<Database>,
    pub catalog: Arc<QuestionStore>,
    pub sessions: Arc<SessionManager>,
    pub result_service: Arc<QuizResultService>,
    pub user_service: Arc<UserService>,
    pub chat_service: Arc<ChatService>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let user_repository = Arc::new(MongoUserRepository::new(&db));
        user_repository.ensure_indexes().await?;
        let result_repository = Arc::new(MongoQuizResultRepository::new(&db));
        result_repository.ensure_indexes().await?;

        let catalog = match &config.question_import_dir {
            Some(dir) => QuestionStore::bundled_with_imports(Path::new(dir))?,
            None => QuestionStore::bundled()?,
        };
        log::info!(
            "Loaded {} questions across {} subjects",
            catalog.len(),
            catalog.subjects().count()
        );

        let client = Arc::new(GeminiClient::from_config(&config));

        Ok(Self::assemble(
            config,
            Some(db),
            catalog,
            user_repository,
            result_repository,
            client,
        ))
    }

    /// Wires services over the given storage and tutor backends.
    pub fn assemble(
        config: Config,
        db: Option<Database>,
        catalog: QuestionStore,
        users: Arc<dyn UserRepository>,
        results: Arc<dyn QuizResultRepository>,
        client: Arc<dyn GenerativeClient>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let result_service = Arc::new(QuizResultService::new(results, users.clone()));
        let sessions = Arc::new(SessionManager::from_config(
            QuizEngine::new(catalog.clone()),
            result_service.clone(),
            &config,
        ));
        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
            config.jwt_refresh_expiration_hours,
        ));

        Self {
            db,
            catalog,
            sessions,
            result_service,
            user_service: Arc::new(UserService::new(users)),
            chat_service: Arc::new(ChatService::new(client)),
            jwt_service,
            config: Arc::new(config),
        }
    }
}

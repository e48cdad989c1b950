use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{
    config::Config,
    errors::AppResult,
    models::domain::{QuizResult, User},
};

/// Handle on the exam-prep database and its two collections.
#[derive(Clone)]
pub struct Database {
    inner: mongodb::Database,
    users_collection: String,
    results_collection: String,
}

impl Database {
    /// Connects and pings the server before returning.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut options = ClientOptions::parse(&config.mongo_conn_string).await?;
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.max_pool_size = Some(10);
        options.connect_timeout = Some(Duration::from_secs(5));
        options.server_selection_timeout = Some(Duration::from_secs(5));

        let database = Self::with_client(Client::with_options(options)?, config);
        database.ping().await?;

        log::info!(
            "Connected to MongoDB database {} (collections: {}, {})",
            config.mongo_db_name,
            database.users_collection,
            database.results_collection
        );
        Ok(database)
    }

    fn with_client(client: Client, config: &Config) -> Self {
        Self {
            inner: client.database(&config.mongo_db_name),
            users_collection: config.users_collection.clone(),
            results_collection: config.results_collection.clone(),
        }
    }

    pub fn users(&self) -> Collection<User> {
        self.inner.collection(&self.users_collection)
    }

    pub fn quiz_results(&self) -> Collection<QuizResult> {
        self.inner.collection(&self.results_collection)
    }

    /// Readiness probe used by `/health/ready`.
    pub async fn ping(&self) -> AppResult<()> {
        self.inner.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

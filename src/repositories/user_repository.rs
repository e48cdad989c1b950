use async_trait::async_trait;
use mongodb::{
    bson::doc,
    options::{IndexOptions, ReplaceOptions},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::User,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;
    async fn find_by_github_id(&self, github_id: &str) -> AppResult<Option<User>>;
    /// Inserts the user, or replaces the profile of the user with the same
    /// GitHub id while keeping its stable `id`.
    async fn upsert_by_github_id(&self, user: User) -> AppResult<User>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.users(),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let user = self.collection.find_one(doc! { "id": id }).await?;
        Ok(user)
    }

    async fn find_by_github_id(&self, github_id: &str) -> AppResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "github_id": github_id })
            .await?;
        Ok(user)
    }

    async fn upsert_by_github_id(&self, mut user: User) -> AppResult<User> {
        let github_id = user.github_id.clone().ok_or_else(|| {
            AppError::ValidationError("User must have a github_id for upsert".to_string())
        })?;

        if let Some(existing) = self.find_by_github_id(&github_id).await? {
            user.id = existing.id;
            user.created_at = existing.created_at;
        }

        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { "github_id": &github_id }, &user)
            .with_options(options)
            .await?;

        Ok(user)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let github_index = IndexModel::builder()
            .keys(doc! { "github_id": 1 })
            .options(IndexOptions::builder().unique(true).sparse(true).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(github_index).await?;
        log::info!("Created unique indexes on users collection");

        Ok(())
    }
}

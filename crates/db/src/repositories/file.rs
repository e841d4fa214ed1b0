//! Uploaded file record repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::files;

/// Metadata of a file the storage provider accepted.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Client the file belongs to.
    pub client_id: i64,
    /// Original filename.
    pub filename: String,
    /// URL returned by the provider.
    pub file_url: String,
    /// Provider-side key.
    pub storage_key: String,
    /// Canonical provider name.
    pub provider: String,
    /// Configuration row the provider was selected from.
    pub storage_config_id: Option<i64>,
    /// MIME type.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Display name of the uploader.
    pub uploader: String,
}

/// Repository for file records.
#[derive(Debug, Clone)]
pub struct FileRepository {
    db: DatabaseConnection,
}

impl FileRepository {
    /// Creates a new file repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The latest `limit` files of a client, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest(&self, client_id: i64, limit: u64) -> Result<Vec<files::Model>, DbErr> {
        files::Entity::find()
            .filter(files::Column::ClientId.eq(client_id))
            .order_by_desc(files::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// Every file of a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn all_for_client(&self, client_id: i64) -> Result<Vec<files::Model>, DbErr> {
        files::Entity::find()
            .filter(files::Column::ClientId.eq(client_id))
            .all(&self.db)
            .await
    }

    /// Finds one file of a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, client_id: i64, id: i64) -> Result<Option<files::Model>, DbErr> {
        files::Entity::find_by_id(id)
            .filter(files::Column::ClientId.eq(client_id))
            .one(&self.db)
            .await
    }

    /// Finds the record of an object by provider and key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_storage_key(
        &self,
        provider: &str,
        storage_key: &str,
    ) -> Result<Option<files::Model>, DbErr> {
        files::Entity::find()
            .filter(files::Column::Provider.eq(provider))
            .filter(files::Column::StorageKey.eq(storage_key))
            .one(&self.db)
            .await
    }

    /// Records an uploaded file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, record: NewFileRecord) -> Result<files::Model, DbErr> {
        files::ActiveModel {
            id: NotSet,
            client_id: Set(record.client_id),
            filename: Set(record.filename),
            file_url: Set(record.file_url),
            storage_key: Set(record.storage_key),
            provider: Set(record.provider),
            storage_config_id: Set(record.storage_config_id),
            content_type: Set(record.content_type),
            size_bytes: Set(record.size_bytes),
            uploader: Set(record.uploader),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Deletes a file record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, id: i64) -> Result<bool, DbErr> {
        let result = files::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}

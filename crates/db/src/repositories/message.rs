//! Chat message repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::messages;

/// Repository for per-client chat threads.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    db: DatabaseConnection,
}

impl MessageRepository {
    /// Creates a new message repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The latest `limit` messages of a client, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest(&self, client_id: i64, limit: u64) -> Result<Vec<messages::Model>, DbErr> {
        let mut rows = messages::Entity::find()
            .filter(messages::Column::ClientId.eq(client_id))
            .order_by_desc(messages::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        rows.reverse();
        Ok(rows)
    }

    /// Appends a message to a client's thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        client_id: i64,
        sender: &str,
        body: &str,
    ) -> Result<messages::Model, DbErr> {
        messages::ActiveModel {
            id: NotSet,
            client_id: Set(client_id),
            sender: Set(sender.to_string()),
            body: Set(body.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }
}

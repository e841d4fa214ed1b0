//! Storage configuration repository and resolver.
//!
//! Rows are never deleted. Activating a new configuration deactivates every
//! row of the tenant and inserts a fresh active row in one transaction, so the
//! table doubles as an audit trail of provider changes.

use clientdesk_core::storage::{
    ConfigStatus, NewStorageConfig, StorageConfig, StorageConfigResolver, StorageError,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    NotSet, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::storage_configs;

/// Repository for per-tenant storage configuration rows.
#[derive(Debug, Clone)]
pub struct StorageConfigRepository {
    db: DatabaseConnection,
}

impl StorageConfigRepository {
    /// Creates a new storage configuration repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The tenant's active row. If several are active, the highest ID wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn active(&self, tenant_id: i64) -> Result<Option<storage_configs::Model>, DbErr> {
        storage_configs::Entity::find()
            .filter(storage_configs::Column::TenantId.eq(tenant_id))
            .filter(storage_configs::Column::Status.eq(ConfigStatus::Active.as_str()))
            .order_by_desc(storage_configs::Column::Id)
            .one(&self.db)
            .await
    }

    /// Every row of the tenant, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn history(&self, tenant_id: i64) -> Result<Vec<storage_configs::Model>, DbErr> {
        storage_configs::Entity::find()
            .filter(storage_configs::Column::TenantId.eq(tenant_id))
            .order_by_desc(storage_configs::Column::Id)
            .all(&self.db)
            .await
    }

    /// Replaces the tenant's active configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; nothing is changed then.
    pub async fn activate(
        &self,
        config: &NewStorageConfig,
    ) -> Result<storage_configs::Model, DbErr> {
        let txn = self.db.begin().await?;

        let deactivated = deactivate(&txn, config.owner_id).await?;

        let now = chrono::Utc::now().into();
        let row = storage_configs::ActiveModel {
            id: NotSet,
            tenant_id: Set(config.owner_id),
            provider: Set(config.provider.as_str().to_string()),
            access_token: Set(config.access_token.clone()),
            bucket_name: Set(config.bucket_name.clone()),
            service_account_json: Set(config.service_account_json.clone()),
            region: Set(config.region.clone()),
            endpoint: Set(config.endpoint.clone()),
            access_key_id: Set(config.access_key_id.clone()),
            secret_access_key: Set(config.secret_access_key.clone()),
            status: Set(ConfigStatus::Active.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            tenant_id = config.owner_id,
            config_id = row.id,
            provider = %config.provider,
            deactivated,
            "Storage configuration activated"
        );
        Ok(row)
    }

    /// Deactivates every row of the tenant. Returns how many were active.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn deactivate_all(&self, tenant_id: i64) -> Result<u64, DbErr> {
        let count = deactivate(&self.db, tenant_id).await?;
        info!(tenant_id, deactivated = count, "Storage disconnected");
        Ok(count)
    }
}

async fn deactivate<C: ConnectionTrait>(conn: &C, tenant_id: i64) -> Result<u64, DbErr> {
    let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
    let result = storage_configs::Entity::update_many()
        .col_expr(
            storage_configs::Column::Status,
            Expr::value(ConfigStatus::Inactive.as_str()),
        )
        .col_expr(storage_configs::Column::UpdatedAt, Expr::value(now))
        .filter(storage_configs::Column::TenantId.eq(tenant_id))
        .filter(storage_configs::Column::Status.eq(ConfigStatus::Active.as_str()))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

impl From<storage_configs::Model> for StorageConfig {
    fn from(row: storage_configs::Model) -> Self {
        Self {
            id: row.id,
            owner_id: row.tenant_id,
            provider: row.provider,
            access_token: row.access_token,
            bucket_name: row.bucket_name,
            service_account_json: row.service_account_json,
            region: row.region,
            endpoint: row.endpoint,
            access_key_id: row.access_key_id,
            secret_access_key: row.secret_access_key,
            status: ConfigStatus::parse(&row.status),
            updated_at: row.updated_at.to_utc(),
        }
    }
}

impl StorageConfigResolver for StorageConfigRepository {
    async fn active_config(&self, owner_id: i64) -> Result<Option<StorageConfig>, StorageError> {
        self.active(owner_id)
            .await
            .map(|row| row.map(StorageConfig::from))
            .map_err(StorageError::config_store)
    }
}

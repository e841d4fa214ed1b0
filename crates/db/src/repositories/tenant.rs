//! Tenant repository.

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, Set};

use crate::entities::tenants;

/// Repository for advisory firms.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    db: DatabaseConnection,
}

impl TenantRepository {
    /// Creates a new tenant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, name: &str) -> Result<tenants::Model, DbErr> {
        tenants::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Finds a tenant by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<tenants::Model>, DbErr> {
        tenants::Entity::find_by_id(id).one(&self.db).await
    }
}

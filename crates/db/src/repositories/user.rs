//! User repository for database operations.

use clientdesk_core::auth::UserRole;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, Set,
};

use crate::entities::users;

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an active user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::IsActive.eq(true))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Creates a new user in a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails (e.g. duplicate email).
    pub async fn create(
        &self,
        tenant_id: i64,
        email: &str,
        password_hash: &str,
        display_name: &str,
        role: UserRole,
    ) -> Result<users::Model, DbErr> {
        users::ActiveModel {
            id: NotSet,
            tenant_id: Set(tenant_id),
            email: Set(email.to_string()),
            display_name: Set(display_name.to_string()),
            password_hash: Set(password_hash.to_string()),
            role: Set(role.as_str().to_string()),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}

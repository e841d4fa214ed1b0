//! Client record repository.

use clientdesk_shared::clients::{CreateClientRequest, UpdateClientRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    NotSet, QueryFilter, QueryOrder, Set,
};

use crate::entities::clients;

/// Repository for client records, always scoped to one tenant.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    db: DatabaseConnection,
}

impl ClientRepository {
    /// Creates a new client repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a tenant's clients, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, tenant_id: i64) -> Result<Vec<clients::Model>, DbErr> {
        clients::Entity::find()
            .filter(clients::Column::TenantId.eq(tenant_id))
            .order_by_desc(clients::Column::CreatedAt)
            .order_by_desc(clients::Column::Id)
            .all(&self.db)
            .await
    }

    /// Finds a client belonging to the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, tenant_id: i64, id: i64) -> Result<Option<clients::Model>, DbErr> {
        clients::Entity::find_by_id(id)
            .filter(clients::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
    }

    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        tenant_id: i64,
        req: &CreateClientRequest,
    ) -> Result<clients::Model, DbErr> {
        let now = chrono::Utc::now().into();
        clients::ActiveModel {
            id: NotSet,
            tenant_id: Set(tenant_id),
            client_type: Set(req.client_type.clone()),
            name: Set(req.name.trim().to_string()),
            email: Set(req.email.clone()),
            phone: Set(req.phone.clone()),
            notes: Set(req.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Applies the present fields of `req`. Returns `None` if the client
    /// does not exist in this tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update(
        &self,
        tenant_id: i64,
        id: i64,
        req: &UpdateClientRequest,
    ) -> Result<Option<clients::Model>, DbErr> {
        let Some(existing) = self.find(tenant_id, id).await? else {
            return Ok(None);
        };

        let mut client = existing.into_active_model();
        if let Some(client_type) = &req.client_type {
            client.client_type = Set(client_type.clone());
        }
        if let Some(name) = &req.name {
            client.name = Set(name.trim().to_string());
        }
        if req.email.is_some() {
            client.email = Set(req.email.clone());
        }
        if req.phone.is_some() {
            client.phone = Set(req.phone.clone());
        }
        if req.notes.is_some() {
            client.notes = Set(req.notes.clone());
        }
        client.updated_at = Set(chrono::Utc::now().into());

        client.update(&self.db).await.map(Some)
    }

    /// Deletes a client. Company info, messages and file records go with it.
    ///
    /// Returns `false` if the client does not exist in this tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, tenant_id: i64, id: i64) -> Result<bool, DbErr> {
        let result = clients::Entity::delete_many()
            .filter(clients::Column::Id.eq(id))
            .filter(clients::Column::TenantId.eq(tenant_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

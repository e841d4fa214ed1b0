//! Company basic information repository.

use clientdesk_shared::clients::CompanyInfoRequest;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    NotSet, QueryFilter, Set,
};

use crate::entities::company_infos;

/// Repository for the single company-info row of a corporate client.
///
/// Callers check that the client belongs to the tenant first.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the company info of a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, client_id: i64) -> Result<Option<company_infos::Model>, DbErr> {
        company_infos::Entity::find()
            .filter(company_infos::Column::ClientId.eq(client_id))
            .one(&self.db)
            .await
    }

    /// Creates the company info, or replaces every field of the existing row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn upsert(
        &self,
        client_id: i64,
        req: &CompanyInfoRequest,
    ) -> Result<company_infos::Model, DbErr> {
        let existing = self.find(client_id).await?;
        let is_new = existing.is_none();
        let mut row = match existing {
            Some(existing) => existing.into_active_model(),
            None => company_infos::ActiveModel {
                id: NotSet,
                client_id: Set(client_id),
                ..Default::default()
            },
        };

        row.company_name = Set(req.company_name.clone());
        row.postal_code = Set(req.postal_code.clone());
        row.prefecture = Set(req.prefecture.clone());
        row.address = Set(req.address.clone());
        row.building = Set(req.building.clone());
        row.phone1 = Set(req.phone1.clone());
        row.phone2 = Set(req.phone2.clone());
        row.fax = Set(req.fax.clone());
        row.email = Set(req.email.clone());
        row.contact_person = Set(req.contact_person.clone());
        row.industry = Set(req.industry.clone());
        row.employee_count = Set(req.employee_count);
        row.corporate_number = Set(req.corporate_number.clone());
        row.updated_at = Set(chrono::Utc::now().into());

        if is_new {
            row.insert(&self.db).await
        } else {
            row.update(&self.db).await
        }
    }

    /// Removes the company info. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, client_id: i64) -> Result<bool, DbErr> {
        let result = company_infos::Entity::delete_many()
            .filter(company_infos::Column::ClientId.eq(client_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

//! `SeaORM` Entity for company basic information (one row per corporate client).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company_infos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub client_id: i64,
    pub company_name: Option<String>,
    pub postal_code: Option<String>,
    pub prefecture: Option<String>,
    pub address: Option<String>,
    pub building: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub contact_person: Option<String>,
    pub industry: Option<String>,
    pub employee_count: Option<i32>,
    pub corporate_number: Option<String>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id",
        on_delete = "Cascade"
    )]
    Clients,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

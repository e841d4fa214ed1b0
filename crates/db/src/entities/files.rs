//! `SeaORM` Entity for uploaded file records.
//!
//! A row exists only for files the storage provider accepted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub client_id: i64,
    pub filename: String,
    pub file_url: String,
    pub storage_key: String,
    pub provider: String,
    /// Storage configuration row that accepted the file; `None` for a
    /// deployment fallback.
    pub storage_config_id: Option<i64>,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub uploader: String,
    pub created_at: DateTimeWithTimeZone,
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

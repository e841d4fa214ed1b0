//! `SeaORM` entity definitions.

pub mod prelude;

pub mod clients;
pub mod company_infos;
pub mod files;
pub mod messages;
pub mod storage_configs;
pub mod tenants;
pub mod users;

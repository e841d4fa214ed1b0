//! Entity re-exports.

pub use super::clients::Entity as Clients;
pub use super::company_infos::Entity as CompanyInfos;
pub use super::files::Entity as Files;
pub use super::messages::Entity as Messages;
pub use super::storage_configs::Entity as StorageConfigs;
pub use super::tenants::Entity as Tenants;
pub use super::users::Entity as Users;

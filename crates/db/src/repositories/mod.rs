//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every tenant-owned lookup takes the tenant ID so rows never leak across firms.

pub mod client;
pub mod company;
pub mod file;
pub mod message;
pub mod storage_config;
pub mod tenant;
pub mod user;

pub use client::ClientRepository;
pub use company::CompanyRepository;
pub use file::{FileRepository, NewFileRecord};
pub use message::MessageRepository;
pub use storage_config::StorageConfigRepository;
pub use tenant::TenantRepository;
pub use user::UserRepository;

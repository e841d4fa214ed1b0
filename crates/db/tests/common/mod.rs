//! Shared setup for repository tests: a migrated in-memory SQLite database.

use clientdesk_db::migration::{Migrator, MigratorTrait};
use clientdesk_db::TenantRepository;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    db
}

pub async fn tenant(db: &DatabaseConnection, name: &str) -> i64 {
    TenantRepository::new(db.clone())
        .create(name)
        .await
        .expect("Failed to create tenant")
        .id
}

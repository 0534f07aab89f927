use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use super::migrations::Migrator;

/// Open the process-wide connection pool shared by every storage adapter.
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);

    // SQLite serialises writes, more connections than this buys nothing
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    Database::connect(opt).await
}

/// Turn a path or url from configuration into a sea-orm connection string.
pub fn get_database_url(database: Option<&str>) -> String {
    match database {
        Some(":memory:") => "sqlite::memory:".to_string(),
        Some(url) if url.starts_with("sqlite:") => url.to_string(),
        Some(path) => format!("sqlite://{}?mode=rwc", path),
        None => "sqlite://showcase.db?mode=rwc".to_string(),
    }
}

/// Bring the schema up to date.
pub async fn setup_database(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await
}

//! Seeds the database with the sample user

use anyhow::Result;
use tracing::info;

use common::database::{DatabaseConfig, init_pool, run_migrations};
use profile::{MIGRATOR, password::PasswordService, repositories::UserRepository, seeder};

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("PROFILE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    profile::init_tracing(&log_level);

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    run_migrations(&pool, &MIGRATOR).await?;

    let repository = UserRepository::new(pool, PasswordService::new());
    seeder::run(&repository).await?;

    info!("Database seeded");
    Ok(())
}

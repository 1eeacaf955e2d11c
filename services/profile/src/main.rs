use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use profile::{
    MIGRATOR,
    config::ServiceConfig,
    middleware::TokenVerifier,
    password::PasswordService,
    repositories::UserRepository,
    routes,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env()?;

    // Initialize logging
    profile::init_tracing(&config.log_level);

    info!("Starting profile service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool, &MIGRATOR).await?;

    let passwords = PasswordService::new();
    let user_repository = UserRepository::new(pool.clone(), passwords.clone());
    let verifier = TokenVerifier::new(&config.jwt_key)?;

    let app_state = AppState {
        db_pool: Some(pool),
        users: Arc::new(user_repository),
        passwords,
        password_policy: config.password_policy(),
        verifier,
    };

    info!("Profile service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Profile service listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

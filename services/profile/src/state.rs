//! Application state shared across handlers

use sqlx::PgPool;
use std::sync::Arc;

use crate::middleware::TokenVerifier;
use crate::password::PasswordService;
use crate::repositories::UserStore;
use crate::validation::PasswordPolicy;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Present when backed by PostgreSQL; used by the health check
    pub db_pool: Option<PgPool>,
    pub users: Arc<dyn UserStore>,
    pub passwords: PasswordService,
    pub password_policy: PasswordPolicy,
    pub verifier: TokenVerifier,
}

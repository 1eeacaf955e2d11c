//! User profile service
//!
//! A user record with explicit input/output DTOs, a seeder for the sample
//! user, and the profile editor workflow exposed over HTTP.

pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod seeder;
pub mod state;
pub mod validation;

use sqlx::migrate::Migrator;
use tracing_subscriber::EnvFilter;

/// Migrations for the `users` table
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Install the global fmt subscriber
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();
}

//! Database seeder

use anyhow::Result;
use tracing::info;

use crate::models::{NewUser, User};
use crate::repositories::UserStore;

/// Name of the sample user
pub const SEED_NAME: &str = "Bruno Henrique da Costa";
/// Email of the sample user
pub const SEED_EMAIL: &str = "bhcosta90@gmail.com";
/// Pre-computed bcrypt hash of the sample user's password
pub const SEED_PASSWORD_HASH: &str = "$2y$12$UtKKMtosexelFA954v43.uPUxbBsuzhIN9Mevc9r2rVh9Zc246Nva";

/// The fixed sample user inserted at initialization
pub fn sample_user() -> NewUser {
    NewUser {
        name: SEED_NAME.to_string(),
        email: SEED_EMAIL.to_string(),
        password: SEED_PASSWORD_HASH.to_string(),
    }
}

/// Insert the sample user
///
/// Store errors, including a duplicate email on a second run, are returned
/// as-is.
pub async fn run(store: &dyn UserStore) -> Result<User> {
    let user = store.create(&sample_user()).await?;
    info!("Seeded user {} <{}>", user.id, user.email);
    Ok(user)
}

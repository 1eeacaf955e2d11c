//! In-memory user store
//!
//! Mirrors the PostgreSQL repository's semantics, including the
//! case-insensitive unique email constraint, without a database. Used by tests and local development.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, ProfileChanges, User};
use crate::password::PasswordService;
use crate::repositories::UserStore;

/// In-memory user store
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
    passwords: PasswordService,
}

impl InMemoryUserStore {
    /// Create an empty store
    pub fn new(passwords: PasswordService) -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            passwords,
        }
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn unique_violation(email: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "duplicate key value violates unique constraint \"users_email_lower_key\": {}",
        email
    )
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .any(|u| same_email(&u.email, email) && Some(u.id) != except))
    }

    async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.email);

        let password = self.passwords.ensure_hashed(&new_user.password)?;

        let mut users = self.users.lock().await;
        if users.values().any(|u| same_email(&u.email, &new_user.email)) {
            return Err(unique_violation(&new_user.email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password,
            email_verified_at: None,
            remember_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<User>> {
        info!("Updating profile for user: {}", id);

        let password = changes
            .password
            .as_deref()
            .map(|p| self.passwords.ensure_hashed(p))
            .transpose()?;

        // Every check happens before the first field is written.
        let mut users = self.users.lock().await;
        if users
            .values()
            .any(|u| same_email(&u.email, &changes.email) && u.id != id)
        {
            return Err(unique_violation(&changes.email));
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        user.name = changes.name.clone();
        user.email = changes.email.clone();
        if let Some(password) = password {
            user.password = password;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

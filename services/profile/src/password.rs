//! Password hashing and verification
//!
//! New hashes are Argon2id PHC strings. Legacy bcrypt hashes (`$2y$...`) are
//! recognized and verifiable so that fixtures and imported accounts keep
//! working, but nothing new is ever written with bcrypt.

use argon2::{
    Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier, password_hash::SaltString,
};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while hashing or verifying passwords
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Hashing failed
    #[error("Failed to hash password: {0}")]
    Hash(String),

    /// The stored value is not a hash this service understands
    #[error("Unrecognized password hash format")]
    UnrecognizedHash,

    /// bcrypt verification failed on a malformed hash
    #[error("Failed to verify bcrypt hash: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

fn bcrypt_regex() -> &'static Regex {
    static BCRYPT_REGEX: OnceLock<Regex> = OnceLock::new();
    BCRYPT_REGEX.get_or_init(|| {
        Regex::new(r"^\$2[abxy]\$\d{2}\$[./A-Za-z0-9]{53}$").expect("Failed to compile bcrypt regex")
    })
}

fn is_argon2_hash(value: &str) -> bool {
    match PasswordHash::new(value) {
        Ok(parsed) => {
            parsed.hash.is_some()
                && matches!(parsed.algorithm.as_str(), "argon2id" | "argon2i" | "argon2d")
        }
        Err(_) => false,
    }
}

fn is_bcrypt_hash(value: &str) -> bool {
    bcrypt_regex().is_match(value)
}

/// Password hashing service
#[derive(Clone, Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Create a new password service with default Argon2id parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a plaintext password
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .to_string();

        Ok(hash)
    }

    /// Whether `value` is already a recognized password hash
    pub fn is_hashed(&self, value: &str) -> bool {
        is_argon2_hash(value) || is_bcrypt_hash(value)
    }

    /// Hash `value` unless it is already a recognized hash
    ///
    /// Applying this twice yields the same stored value as applying it once.
    pub fn ensure_hashed(&self, value: &str) -> Result<String, PasswordError> {
        if self.is_hashed(value) {
            Ok(value.to_string())
        } else {
            self.hash(value)
        }
    }

    /// Verify a plaintext password against a stored hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        if is_bcrypt_hash(hash) {
            return Ok(bcrypt::verify(password, hash)?);
        }

        let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::UnrecognizedHash)?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

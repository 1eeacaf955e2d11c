//! Profile service models

pub mod user;

// Re-export for convenience
pub use user::{EditableUser, NewUser, ProfileChanges, User, UserResponse};

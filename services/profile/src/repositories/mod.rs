//! Repositories for user persistence

pub mod memory;
pub mod user;

pub use memory::InMemoryUserStore;
pub use user::{UserRepository, UserStore};

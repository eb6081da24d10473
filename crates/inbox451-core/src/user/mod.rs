//! Users and their credentials.

mod model;
mod password;
mod repository;

pub use model::{User, UserRole, UserStatus};
pub use password::{hash_password, verify_password};
pub use repository::UserRepository;

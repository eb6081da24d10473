//! API tokens.

mod model;
mod repository;

pub use model::{DEFAULT_TOKEN_NAME, TOKEN_LENGTH, Token, generate_token};
pub use repository::TokenRepository;

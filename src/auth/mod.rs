//! Password hashing and opaque bearer tokens.

pub mod password;
pub mod token;

use thiserror::Error;

use crate::store::StoreError;

pub use token::{TokenKind, TokenPair, TokenPolicy};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Could not validate credentials")]
    InvalidToken,

    #[error("Malformed password hash")]
    MalformedHash,

    #[error(transparent)]
    Store(#[from] StoreError),
}

//! Error types for groupwork-core

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;

/// Result type alias using groupwork-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in groupwork-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote resource error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Auth/session error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

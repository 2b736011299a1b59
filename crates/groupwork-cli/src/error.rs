use std::io;

use groupwork_core::api::ApiError;
use groupwork_core::auth::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] groupwork_core::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Not signed in. Run `groupwork auth login --email <EMAIL> --password <PASSWORD>` first.")]
    NotSignedIn,
    #[error("{0} cannot be empty")]
    EmptyIdentifier(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    MutationFailed(String),
}

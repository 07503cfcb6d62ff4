use regdraft_core::error::CoreError;

/// Errors that can occur when talking to the registration backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a usable response (connection refused,
    /// timeout, undecodable body).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ClientResult<T> = Result<T, ClientError>;

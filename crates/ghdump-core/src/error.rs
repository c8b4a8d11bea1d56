use std::path::PathBuf;

/// Central error type for gh-dump.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("target dump folder {} already exists, aborting", path.display())]
    DestinationExists { path: PathBuf },

    #[error("could not create dump folder {}: {source}", path.display())]
    DestinationUncreatable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid account name: {account:?}")]
    InvalidAccount { account: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("authentication failed ({status}): {message}")]
    AuthFailed { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("malformed API response: {message}")]
    MalformedResponse { message: String },

    #[error("refusing to clone batch: {message}")]
    InvalidBatch { message: String },

    #[error("credential error: {message}")]
    CredentialError { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Coarse grouping of [`DumpError`] variants by the stage of a run they abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Setup,
    Credential,
    Listing,
    Batch,
    Other,
}

impl DumpError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DumpError::DestinationExists { .. }
            | DumpError::DestinationUncreatable { .. }
            | DumpError::Config { .. } => ErrorCategory::Setup,
            DumpError::CredentialError { .. } => ErrorCategory::Credential,
            DumpError::InvalidAccount { .. }
            | DumpError::Network { .. }
            | DumpError::AuthFailed { .. }
            | DumpError::ApiError { .. }
            | DumpError::MalformedResponse { .. } => ErrorCategory::Listing,
            DumpError::InvalidBatch { .. } => ErrorCategory::Batch,
            DumpError::Io(_) | DumpError::Serialization(_) => ErrorCategory::Other,
        }
    }
}

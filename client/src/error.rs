//! Error types for upload sessions

use thiserror::Error;
use upload_broker::BrokerError;

/// Result type for upload session operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can fail an upload attempt
#[derive(Error, Debug)]
pub enum UploadError {
    /// SVG rejected unconditionally before any network call
    #[error("SVG files are not allowed for security reasons")]
    UnsupportedFileType,

    /// File matches no entry of the configured accept filter
    #[error("Only {accept} files are accepted")]
    NotAccepted {
        /// The configured accept filter, verbatim
        accept: String,
    },

    /// File exceeds the configured size limit
    #[error("File \"{name}\" is too big ({size} bytes) - max {limit} bytes allowed")]
    FileTooLarge {
        /// Original filename
        name: String,
        /// Declared size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Credential issuance or cleanup failed on the broker side
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// The storage endpoint answered the PUT with a non-2xx status
    #[error("Failed to upload file: HTTP {status}")]
    UploadRejected {
        /// HTTP status returned by the storage endpoint
        status: u16,
    },

    /// Network failure while performing the PUT
    #[error("Upload request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Size limit option could not be parsed
    #[error("Invalid size limit: {0}")]
    InvalidSizeLimit(String),
}

//! Error types for broker operations

use aws_sdk_s3::{
    error::SdkError,
    operation::{
        delete_bucket_cors::DeleteBucketCorsError, put_bucket_cors::PutBucketCorsError,
    },
};
use thiserror::Error;

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur while brokering an upload
#[derive(Error, Debug)]
pub enum BrokerError {
    /// File type rejected unconditionally (SVG script-injection surface)
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Failure reading or writing bucket state, or presigning a request
    #[error("S3 store error: {0}")]
    StoreError(String),

    /// Broker or presigning configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<SdkError<PutBucketCorsError>> for BrokerError {
    fn from(error: SdkError<PutBucketCorsError>) -> Self {
        Self::StoreError(format!("failed to write bucket CORS configuration: {error}"))
    }
}

impl From<SdkError<DeleteBucketCorsError>> for BrokerError {
    fn from(error: SdkError<DeleteBucketCorsError>) -> Self {
        Self::StoreError(format!("failed to delete bucket CORS configuration: {error}"))
    }
}

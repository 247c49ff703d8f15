//! Client-side upload session orchestration.
//!
//! Validates a chosen file against an accept filter and a size limit,
//! requests a presigned credential from the broker, performs the raw PUT, and
//! confirms completion so the temporary CORS window closes immediately.
//!
//! ```no_run
//! use std::sync::Arc;
//! use upload_broker::{BrokerConfig, CredentialIssuer, FileMetadata};
//! use upload_client::{UploadOptions, UploadSession};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
//! let s3_client = Arc::new(aws_sdk_s3::Client::new(&config));
//! let issuer = Arc::new(CredentialIssuer::new(s3_client, BrokerConfig::new("my-bucket"))?);
//!
//! let options = UploadOptions::new().accept("image/*").size_limit("5MB")?;
//! let mut session = UploadSession::new(issuer, options);
//!
//! let file = FileMetadata {
//!     name: "photo.png".to_owned(),
//!     size: 4,
//!     mime_type: "image/png".to_owned(),
//! };
//! let key = session.upload(&file, vec![1, 2, 3, 4], "app.example.com").await?;
//! println!("uploaded as {key}");
//! # Ok(())
//! # }
//! ```

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Error types for upload sessions
pub mod error;

/// Accept-filter parsing and matching
pub mod filter;

/// Human-readable size limit parsing
pub mod limit;

/// Upload session state machine
pub mod session;

pub use error::{UploadError, UploadResult};
pub use filter::AcceptFilter;
pub use limit::parse_size_limit;
pub use session::{UploadOptions, UploadSession, UploadState};

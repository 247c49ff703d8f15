//! Broker for direct browser-to-S3 uploads over presigned PUT URLs.
//!
//! Issues a short-lived, single-object write credential, temporarily relaxes
//! the bucket's CORS policy so the browser-side PUT succeeds, and guarantees
//! the relaxation is reverted whether or not the client completes the upload.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Broker configuration (expiry, reap delay, CORS max-age)
pub mod config;

/// Temporary CORS window management
pub mod cors;

/// Environment configuration for different deployment stages
pub mod environment;

/// Error types for broker operations
pub mod error;

/// Presigned upload credential issuance
pub mod issuer;

/// Collision-resistant object key generation
pub mod object_key;

/// Deferred best-effort CORS window cleanup
pub mod reaper;

pub use config::BrokerConfig;
pub use cors::{CorsWindowGuard, CorsWindowManager};
pub use environment::Environment;
pub use error::{BrokerError, BrokerResult};
pub use issuer::{CredentialIssuer, FileMetadata, UploadGrant};
pub use object_key::generate_object_key;
pub use reaper::ReapHandle;

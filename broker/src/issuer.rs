//! Presigned upload credential issuance
//!
//! Issuing a credential opens the CORS window for the caller's origin,
//! schedules the expiry reaper, and presigns a single-object PUT. Everything
//! a session needs afterwards travels in the returned [`UploadGrant`]: the
//! generated key, the signed URL, the window guard, and the reap handle.

use std::sync::Arc;

use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::BrokerConfig;
use crate::cors::{CorsWindowGuard, CorsWindowManager};
use crate::error::{BrokerError, BrokerResult};
use crate::object_key::generate_object_key;
use crate::reaper::{self, ReapHandle};

/// MIME type rejected unconditionally: SVG is a script-injection surface
pub const SVG_MIME_TYPE: &str = "image/svg+xml";

/// The generic binary placeholder type, treated as "no declared type"
pub const GENERIC_BINARY_MIME_TYPE: &str = "application/octet-stream";

/// Client-declared metadata of the file to upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Original filename, used to derive the object key
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Declared MIME type; may be empty when the browser could not detect one
    pub mime_type: String,
}

impl FileMetadata {
    /// Whether the declared MIME type is concrete enough to sign.
    ///
    /// An empty type and the generic binary placeholder both mean the client
    /// does not actually know the content type, so it is left out of the
    /// signature rather than pinning the PUT to a guess.
    #[must_use]
    pub fn has_concrete_mime_type(&self) -> bool {
        !self.mime_type.is_empty() && self.mime_type != GENERIC_BINARY_MIME_TYPE
    }
}

/// A time-boxed, single-object write authorization
#[derive(Debug)]
pub struct UploadGrant {
    key: String,
    url: String,
    expires_at: DateTime<Utc>,
    window: CorsWindowGuard,
    reap: ReapHandle,
}

impl UploadGrant {
    /// The object key this credential is scoped to
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The presigned PUT URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// When the credential stops being accepted
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Guard over this upload's temporary CORS rule
    #[must_use]
    pub const fn window(&self) -> &CorsWindowGuard {
        &self.window
    }

    /// Handle to this upload's scheduled reap task
    #[must_use]
    pub const fn reap(&self) -> &ReapHandle {
        &self.reap
    }
}

/// Issues presigned upload credentials for one bucket
#[derive(Debug)]
pub struct CredentialIssuer {
    client: Arc<S3Client>,
    cors: Arc<CorsWindowManager>,
    config: BrokerConfig,
}

impl CredentialIssuer {
    /// Creates an issuer from a pre-configured S3 client
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::ConfigError`] if the configured timings violate
    /// the reap-delay invariant.
    pub fn new(client: Arc<S3Client>, config: BrokerConfig) -> BrokerResult<Self> {
        config.validate()?;
        let cors = Arc::new(CorsWindowManager::new(
            client.clone(),
            config.bucket.clone(),
            config.cors_max_age_secs,
        ));
        Ok(Self {
            client,
            cors,
            config,
        })
    }

    /// The CORS window manager serving this issuer's bucket
    #[must_use]
    pub const fn cors(&self) -> &Arc<CorsWindowManager> {
        &self.cors
    }

    /// Issues a presigned PUT credential for one upload attempt.
    ///
    /// Opens the CORS window for `origin_host`, generates the object key,
    /// schedules the expiry reaper, and presigns the PUT. Content-length is
    /// always part of the signed request; content-type only when the declared
    /// type is concrete.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::UnsupportedFileType`] for SVG input before any
    /// network call, and [`BrokerError::StoreError`] if the CORS write or the
    /// presigning fails.
    pub async fn issue(
        &self,
        file: &FileMetadata,
        origin_host: &str,
    ) -> BrokerResult<UploadGrant> {
        if file.mime_type == SVG_MIME_TYPE {
            return Err(BrokerError::UnsupportedFileType(format!(
                "{SVG_MIME_TYPE} is not allowed for security reasons"
            )));
        }

        let window = self.cors.open_window(origin_host).await?;
        let key = generate_object_key(&file.name);
        let reap = self.schedule_reap(window.clone());

        let url = self.presign_put(&key, file).await?;
        let expires_at = Utc::now() + self.config.credential_expiry;

        info!(
            bucket = %self.config.bucket,
            %key,
            %expires_at,
            "issued upload credential"
        );
        Ok(UploadGrant {
            key,
            url,
            expires_at,
            window,
            reap,
        })
    }

    /// Success-path cleanup: cancels the pending reap and closes the CORS
    /// window immediately instead of waiting for the timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::StoreError`] if the policy write fails; the
    /// reaper stays cancelled, but the window guard keeps its pending rule so
    /// the call can be retried.
    pub async fn confirm_and_cleanup(&self, grant: &UploadGrant) -> BrokerResult<()> {
        grant.reap.cancel();
        self.cors.close_window(&grant.window).await
    }

    fn schedule_reap(&self, window: CorsWindowGuard) -> ReapHandle {
        let cors = self.cors.clone();
        let delay = self.config.reap_delay;
        reaper::schedule(delay, async move {
            if let Err(error) = cors.close_window(&window).await {
                // Best-effort deferred context: log, never re-raise
                warn!(?delay, "expiry reaper failed to close CORS window: {error}");
            }
        })
    }

    async fn presign_put(&self, key: &str, file: &FileMetadata) -> BrokerResult<String> {
        let content_length = i64::try_from(file.size).map_err(|_| {
            BrokerError::ConfigError(format!("file size {} exceeds the signable range", file.size))
        })?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_length(content_length);
        if file.has_concrete_mime_type() {
            request = request.content_type(&file.mime_type);
        }

        let presigning = PresigningConfig::expires_in(self.config.credential_expiry)
            .map_err(|error| {
                BrokerError::ConfigError(format!("failed to create presigning config: {error}"))
            })?;

        let presigned = request.presigned(presigning).await.map_err(|error| {
            BrokerError::StoreError(format!("failed to presign upload: {error}"))
        })?;
        Ok(presigned.uri().to_string())
    }
}

//! Upload session state machine
//!
//! One session drives one upload attempt end to end: validate the file,
//! request a credential, PUT the bytes, confirm completion. Each attempt
//! carries its own grant, so concurrent sessions never share state.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tracing::{debug, info};
use upload_broker::{CredentialIssuer, FileMetadata};

use crate::error::{UploadError, UploadResult};
use crate::filter::AcceptFilter;
use crate::limit::parse_size_limit;

/// Default size limit: 1 MB
pub const DEFAULT_SIZE_LIMIT: u64 = 1024 * 1024;

/// Observable state of an upload session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// No upload attempted yet
    Idle,
    /// Checking the file against the accept filter and size limit
    Validating,
    /// Requesting a presigned credential from the broker
    Requesting,
    /// Performing the raw PUT against the signed URL
    Uploading,
    /// Confirming completion and closing the CORS window
    Finalizing,
    /// Upload completed and confirmed
    Succeeded,
    /// Upload failed; the error was returned to the caller
    Failed,
}

type CompletionCallback = Arc<dyn Fn(&str, &FileMetadata) + Send + Sync>;

/// Options for an upload session
#[derive(Clone)]
pub struct UploadOptions {
    accept: AcceptFilter,
    size_limit: u64,
    on_upload_complete: Option<CompletionCallback>,
}

impl UploadOptions {
    /// Accept any file up to 1 MB, with no completion callback
    #[must_use]
    pub fn new() -> Self {
        Self {
            accept: AcceptFilter::any(),
            size_limit: DEFAULT_SIZE_LIMIT,
            on_upload_complete: None,
        }
    }

    /// Sets the accept filter, e.g. `image/*,.pdf`
    #[must_use]
    pub fn accept(mut self, filter: &str) -> Self {
        self.accept = AcceptFilter::parse(filter);
        self
    }

    /// Sets the size limit from a human-readable quantity, e.g. `5MB`
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::InvalidSizeLimit`] when the quantity cannot be
    /// parsed.
    pub fn size_limit(mut self, limit: &str) -> UploadResult<Self> {
        self.size_limit = parse_size_limit(limit)?;
        Ok(self)
    }

    /// Sets a callback invoked with `(key, file)` after a confirmed upload
    #[must_use]
    pub fn on_upload_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &FileMetadata) + Send + Sync + 'static,
    {
        self.on_upload_complete = Some(Arc::new(callback));
        self
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("accept", &self.accept)
            .field("size_limit", &self.size_limit)
            .field(
                "on_upload_complete",
                &self.on_upload_complete.as_ref().map(|_| "Fn"),
            )
            .finish()
    }
}

/// Drives one upload attempt at a time against a broker
pub struct UploadSession {
    issuer: Arc<CredentialIssuer>,
    http: reqwest::Client,
    options: UploadOptions,
    state: UploadState,
}

impl fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl UploadSession {
    /// Creates a session against `issuer`
    #[must_use]
    pub fn new(issuer: Arc<CredentialIssuer>, options: UploadOptions) -> Self {
        Self {
            issuer,
            http: reqwest::Client::new(),
            options,
            state: UploadState::Idle,
        }
    }

    /// Current state of the session
    #[must_use]
    pub const fn state(&self) -> UploadState {
        self.state
    }

    /// Uploads `body` as `file`, returning the object key on success.
    ///
    /// `origin_host` is the browser origin the CORS window must permit
    /// (host, optionally with port, no scheme). Any failure leaves the
    /// session in [`UploadState::Failed`] and surfaces the triggering error.
    ///
    /// # Errors
    ///
    /// See [`UploadError`] for the failure modes; validation errors are
    /// returned before any network call.
    pub async fn upload(
        &mut self,
        file: &FileMetadata,
        body: Vec<u8>,
        origin_host: &str,
    ) -> UploadResult<String> {
        self.state = UploadState::Validating;
        match self.run(file, body, origin_host).await {
            Ok(key) => {
                self.state = UploadState::Succeeded;
                info!(%key, file = %file.name, "upload succeeded");
                Ok(key)
            }
            Err(error) => {
                self.state = UploadState::Failed;
                Err(error)
            }
        }
    }

    async fn run(
        &mut self,
        file: &FileMetadata,
        body: Vec<u8>,
        origin_host: &str,
    ) -> UploadResult<String> {
        self.validate(file)?;

        self.state = UploadState::Requesting;
        let grant = self.issuer.issue(file, origin_host).await?;
        debug!(key = %grant.key(), "credential issued");

        self.state = UploadState::Uploading;
        let mut request = self
            .http
            .put(grant.url())
            .header(CONTENT_LENGTH, file.size)
            .body(body);
        if !file.mime_type.is_empty() {
            request = request.header(CONTENT_TYPE, file.mime_type.as_str());
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(UploadError::UploadRejected {
                status: response.status().as_u16(),
            });
        }

        self.state = UploadState::Finalizing;
        let key = grant.key().to_owned();
        self.issuer.confirm_and_cleanup(&grant).await?;
        if let Some(callback) = &self.options.on_upload_complete {
            callback(&key, file);
        }
        Ok(key)
    }

    fn validate(&self, file: &FileMetadata) -> UploadResult<()> {
        if file.mime_type == upload_broker::issuer::SVG_MIME_TYPE {
            return Err(UploadError::UnsupportedFileType);
        }
        if !self.options.accept.matches(file) {
            return Err(UploadError::NotAccepted {
                accept: self.options.accept.as_str().to_owned(),
            });
        }
        if file.size > self.options.size_limit {
            return Err(UploadError::FileTooLarge {
                name: file.name.clone(),
                size: file.size,
                limit: self.options.size_limit,
            });
        }
        Ok(())
    }
}

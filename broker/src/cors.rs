//! Temporary CORS window management
//!
//! The bucket's CORS rule set is a shared resource with no transactional
//! read-modify-write guarantee from S3, so every open/close cycle on one
//! manager is serialized behind an async mutex. The pending temporary rule is
//! session-scoped: each `open_window` call returns its own guard, and closing
//! through that guard is idempotent.

use std::sync::Arc;

use aws_sdk_s3::{
    types::{CorsConfiguration, CorsRule},
    Client as S3Client,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{BrokerError, BrokerResult};

/// Handle to one pending temporary CORS rule.
///
/// Cloneable so the success path and the expiry reaper can race on cleanup;
/// whichever closes first takes the rule out, the other observes an empty
/// slot and does nothing.
#[derive(Debug, Clone)]
pub struct CorsWindowGuard {
    pending: Arc<Mutex<Option<CorsRule>>>,
}

impl CorsWindowGuard {
    fn new(rule: CorsRule) -> Self {
        Self {
            pending: Arc::new(Mutex::new(Some(rule))),
        }
    }

    /// Whether this guard still holds a pending rule
    pub async fn is_open(&self) -> bool {
        self.pending.lock().await.is_some()
    }
}

/// Serializes reads and writes of one bucket's CORS rule set
#[derive(Debug)]
pub struct CorsWindowManager {
    client: Arc<S3Client>,
    bucket: String,
    max_age_secs: i32,
    policy_lock: Mutex<()>,
}

impl CorsWindowManager {
    /// Creates a manager for one bucket
    #[must_use]
    pub fn new(client: Arc<S3Client>, bucket: String, max_age_secs: i32) -> Self {
        Self {
            client,
            bucket,
            max_age_secs,
            policy_lock: Mutex::new(()),
        }
    }

    /// Fetches the live CORS rule set.
    ///
    /// Any read failure, including `NoSuchCORSConfiguration`, degrades to the
    /// empty set: absence of a policy is not an error state.
    pub async fn current_rules(&self) -> Vec<CorsRule> {
        match self
            .client
            .get_bucket_cors()
            .bucket(&self.bucket)
            .send()
            .await
        {
            Ok(output) => output.cors_rules().to_vec(),
            Err(error) => {
                debug!(
                    bucket = %self.bucket,
                    "no readable CORS configuration: {error}"
                );
                Vec::new()
            }
        }
    }

    /// Opens a temporary CORS window permitting a single origin to PUT.
    ///
    /// Appends the window rule to the live rule set and writes the full set
    /// back. The returned guard carries the pending rule for later removal.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::StoreError`] if the policy write fails.
    pub async fn open_window(&self, origin_host: &str) -> BrokerResult<CorsWindowGuard> {
        let origin = qualified_origin(origin_host);
        let rule = window_rule(&origin, self.max_age_secs)?;

        let _permit = self.policy_lock.lock().await;
        let mut rules = self.current_rules().await;
        rules.push(rule.clone());
        self.write_rules(rules).await?;

        info!(bucket = %self.bucket, %origin, "opened temporary CORS window");
        Ok(CorsWindowGuard::new(rule))
    }

    /// Closes a previously opened window, restoring the prior rule set.
    ///
    /// Idempotent: a second close through the same guard (or a clone of it)
    /// observes no pending rule and performs no network call. When the
    /// remaining rule set is empty the CORS configuration is deleted
    /// entirely, since an empty rule list is itself invalid on S3.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::StoreError`] if the policy write fails; the
    /// pending rule is restored into the guard so a later close can retry.
    pub async fn close_window(&self, guard: &CorsWindowGuard) -> BrokerResult<()> {
        let Some(rule) = guard.pending.lock().await.take() else {
            debug!(bucket = %self.bucket, "CORS window already closed");
            return Ok(());
        };

        if let Err(error) = self.remove_rule(&rule).await {
            *guard.pending.lock().await = Some(rule);
            return Err(error);
        }
        Ok(())
    }

    async fn remove_rule(&self, rule: &CorsRule) -> BrokerResult<()> {
        let _permit = self.policy_lock.lock().await;
        let mut rules = self.current_rules().await;

        // Remove one instance by value: a concurrent session from the same
        // origin may hold an identical rule that must survive this close.
        if let Some(position) = rules.iter().position(|candidate| candidate == rule) {
            rules.remove(position);
        } else {
            debug!(bucket = %self.bucket, "pending CORS rule no longer present");
        }

        if rules.is_empty() {
            self.client
                .delete_bucket_cors()
                .bucket(&self.bucket)
                .send()
                .await?;
            info!(bucket = %self.bucket, "closed CORS window; configuration deleted");
        } else {
            self.write_rules(rules).await?;
            info!(bucket = %self.bucket, "closed CORS window");
        }
        Ok(())
    }

    async fn write_rules(&self, rules: Vec<CorsRule>) -> BrokerResult<()> {
        let configuration = CorsConfiguration::builder()
            .set_cors_rules(Some(rules))
            .build()
            .map_err(|error| {
                BrokerError::ConfigError(format!("invalid CORS configuration: {error}"))
            })?;

        self.client
            .put_bucket_cors()
            .bucket(&self.bucket)
            .cors_configuration(configuration)
            .send()
            .await?;
        Ok(())
    }
}

/// Prefixes a scheme onto a browser-supplied origin host.
///
/// Development hosts (anything whose host portion contains `localhost`) get
/// the unencrypted scheme; everything else gets `https`.
fn qualified_origin(origin_host: &str) -> String {
    let host = origin_host.split(':').next().unwrap_or(origin_host);
    if host.contains("localhost") {
        format!("http://{origin_host}")
    } else {
        format!("https://{origin_host}")
    }
}

/// Builds the temporary window rule: PUT only, any request header, one origin,
/// no exposed headers.
fn window_rule(origin: &str, max_age_secs: i32) -> BrokerResult<CorsRule> {
    CorsRule::builder()
        .allowed_headers("*")
        .allowed_methods("PUT")
        .allowed_origins(origin)
        .max_age_seconds(max_age_secs)
        .build()
        .map_err(|error| BrokerError::ConfigError(format!("invalid CORS rule: {error}")))
}

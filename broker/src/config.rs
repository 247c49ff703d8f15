//! Broker configuration (expiry, reap delay, CORS max-age)

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::error::{BrokerError, BrokerResult};

/// Default presigned credential lifetime
pub const DEFAULT_CREDENTIAL_EXPIRY: Duration = Duration::from_secs(10);

/// Default reap delay (twice the credential lifetime, the recommended margin)
pub const DEFAULT_REAP_DELAY: Duration = Duration::from_secs(20);

/// Default max-age of the temporary CORS rule in seconds
pub const DEFAULT_CORS_MAX_AGE_SECS: i32 = 3000;

/// Tunable parameters for one bucket's upload brokering
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Target bucket name
    pub bucket: String,
    /// Lifetime of issued presigned credentials
    pub credential_expiry: Duration,
    /// Delay before the expiry reaper closes an unconfirmed CORS window
    pub reap_delay: Duration,
    /// Max-age of the temporary CORS rule in seconds
    pub cors_max_age_secs: i32,
}

impl BrokerConfig {
    /// Creates a configuration for `bucket` with default timings
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            credential_expiry: DEFAULT_CREDENTIAL_EXPIRY,
            reap_delay: DEFAULT_REAP_DELAY,
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
        }
    }

    /// Loads the configuration from environment variables.
    ///
    /// `UPLOAD_BUCKET_NAME` is required; `UPLOAD_CREDENTIAL_EXPIRY_SECS` and
    /// `UPLOAD_REAP_DELAY_SECS` override the default timings when set to a
    /// valid integer.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::ConfigError`] if `UPLOAD_BUCKET_NAME` is unset.
    pub fn from_env() -> BrokerResult<Self> {
        let bucket = env::var("UPLOAD_BUCKET_NAME").map_err(|_| {
            BrokerError::ConfigError("UPLOAD_BUCKET_NAME environment variable not set".to_string())
        })?;

        let mut config = Self::new(bucket);
        if let Some(secs) = parse_secs_var("UPLOAD_CREDENTIAL_EXPIRY_SECS") {
            config.credential_expiry = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_secs_var("UPLOAD_REAP_DELAY_SECS") {
            config.reap_delay = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Overrides the presigned credential lifetime
    #[must_use]
    pub const fn with_credential_expiry(mut self, expiry: Duration) -> Self {
        self.credential_expiry = expiry;
        self
    }

    /// Overrides the reap delay
    #[must_use]
    pub const fn with_reap_delay(mut self, delay: Duration) -> Self {
        self.reap_delay = delay;
        self
    }

    /// Overrides the CORS rule max-age
    #[must_use]
    pub const fn with_cors_max_age(mut self, secs: i32) -> Self {
        self.cors_max_age_secs = secs;
        self
    }

    /// Checks the timing invariants.
    ///
    /// The reap delay must be at least the credential expiry, otherwise the
    /// window could be torn down while a still-valid credential is in use. A
    /// delay under twice the expiry is accepted but logged as marginal.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::ConfigError`] if the reap delay is shorter than
    /// the credential expiry.
    pub fn validate(&self) -> BrokerResult<()> {
        if self.reap_delay < self.credential_expiry {
            return Err(BrokerError::ConfigError(format!(
                "reap delay {:?} is shorter than the credential expiry {:?}",
                self.reap_delay, self.credential_expiry
            )));
        }
        if self.reap_delay < self.credential_expiry * 2 {
            warn!(
                reap_delay = ?self.reap_delay,
                credential_expiry = ?self.credential_expiry,
                "reap delay is under twice the credential expiry; slow uploads may be reaped"
            );
        }
        Ok(())
    }
}

fn parse_secs_var(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|val| val.parse::<u64>().ok())
}

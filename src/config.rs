use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{LoaderError, Result};
use crate::loader::RequestKind;

/// Retry and timeout settings handed to the transport for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub max_retries: u32,
    /// Upper bound on a single attempt.
    pub timeout: Duration,
    /// Delay before the first retry; doubled for each subsequent one.
    pub retry_delay: Duration,
    /// Cap applied to the doubled delay.
    pub max_retry_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2_u32.saturating_pow(attempt - 1);
        self.retry_delay
            .checked_mul(factor)
            .unwrap_or(self.max_retry_delay)
            .min(self.max_retry_delay)
    }
}

/// Loader configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Policy used for `Manifest` requests
    pub manifest_policy: RetryPolicy,
    /// Policy shared by `Level` and `AudioTrack` requests
    pub level_policy: RetryPolicy,
    /// Capacity of the outbound event channel
    pub event_channel_capacity: usize,
    /// User agent sent with every playlist request
    pub user_agent: String,
}

const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 64_000;

impl Default for Config {
    fn default() -> Self {
        let max_retry_delay = Duration::from_millis(DEFAULT_MAX_RETRY_DELAY_MS);
        Self {
            manifest_policy: RetryPolicy {
                max_retries: 1,
                timeout: Duration::from_millis(10_000),
                retry_delay: Duration::from_millis(1_000),
                max_retry_delay,
            },
            level_policy: RetryPolicy {
                max_retries: 4,
                timeout: Duration::from_millis(10_000),
                retry_delay: Duration::from_millis(1_000),
                max_retry_delay,
            },
            event_channel_capacity: 64,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// Every variable is optional; unset ones keep the value from [`Config::default`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let max_retry_delay = Duration::from_millis(env_or(
            "MAX_RETRY_DELAY_MS",
            defaults.manifest_policy.max_retry_delay.as_millis() as u64,
        )?);

        let manifest_policy = RetryPolicy {
            max_retries: env_or(
                "MANIFEST_LOADING_MAX_RETRY",
                defaults.manifest_policy.max_retries,
            )?,
            timeout: Duration::from_millis(env_or(
                "MANIFEST_LOADING_TIMEOUT_MS",
                defaults.manifest_policy.timeout.as_millis() as u64,
            )?),
            retry_delay: Duration::from_millis(env_or(
                "MANIFEST_LOADING_RETRY_DELAY_MS",
                defaults.manifest_policy.retry_delay.as_millis() as u64,
            )?),
            max_retry_delay,
        };

        let level_policy = RetryPolicy {
            max_retries: env_or("LEVEL_LOADING_MAX_RETRY", defaults.level_policy.max_retries)?,
            timeout: Duration::from_millis(env_or(
                "LEVEL_LOADING_TIMEOUT_MS",
                defaults.level_policy.timeout.as_millis() as u64,
            )?),
            retry_delay: Duration::from_millis(env_or(
                "LEVEL_LOADING_RETRY_DELAY_MS",
                defaults.level_policy.retry_delay.as_millis() as u64,
            )?),
            max_retry_delay,
        };

        let event_channel_capacity =
            env_or("EVENT_CHANNEL_CAPACITY", defaults.event_channel_capacity)?;
        let user_agent = env::var("USER_AGENT").unwrap_or(defaults.user_agent);

        Ok(Config {
            manifest_policy,
            level_policy,
            event_channel_capacity,
            user_agent,
        })
    }

    /// Manifest requests use their own policy; level and audio track requests share one.
    pub fn retry_policy(&self, kind: RequestKind) -> &RetryPolicy {
        match kind {
            RequestKind::Manifest => &self.manifest_policy,
            RequestKind::Level | RequestKind::AudioTrack => &self.level_policy,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| LoaderError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

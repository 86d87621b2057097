//! Client options and configuration
//!
//! This module contains the runtime configuration of the client, including a
//! builder pattern and an environment loader.

use std::path::PathBuf;
use std::time::Duration;

use crate::api::BaseUrl;
use crate::error::{CleanerError, Result};

// ============================================================================
// Defaults
// ============================================================================

/// Activity-log lines kept by default
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// HTTP request timeout by default
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// First reconnect delay of the push channel
pub const DEFAULT_RECONNECT_INITIAL: Duration = Duration::from_millis(500);

/// Reconnect delay ceiling of the push channel
pub const DEFAULT_RECONNECT_MAX: Duration = Duration::from_secs(10);

/// Largest push frame accepted (1MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

const ENV_URL: &str = "AI_CLEANER_URL";
const ENV_STATE_DIR: &str = "AI_CLEANER_STATE_DIR";
const ENV_LOG_CAPACITY: &str = "AI_CLEANER_LOG_CAPACITY";
const ENV_REQUEST_TIMEOUT: &str = "AI_CLEANER_REQUEST_TIMEOUT_SECS";

// ============================================================================
// Client Options
// ============================================================================

/// Runtime options of the client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Backend base URL
    pub base_url: BaseUrl,
    /// Directory of the persisted store; `None` keeps state in memory
    pub state_dir: Option<PathBuf>,
    /// Activity-log lines kept, 0 for unbounded
    pub max_log_entries: usize,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// First push-channel reconnect delay
    pub reconnect_initial: Duration,
    /// Push-channel reconnect delay ceiling
    pub reconnect_max: Duration,
    /// Largest accepted push frame in bytes
    pub max_frame_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: BaseUrl::default(),
            state_dir: None,
            max_log_entries: DEFAULT_LOG_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconnect_initial: DEFAULT_RECONNECT_INITIAL,
            reconnect_max: DEFAULT_RECONNECT_MAX,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ClientOptions {
    /// Create a new builder for `ClientOptions`
    #[must_use]
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }

    /// Builder starting from these options
    #[must_use]
    pub fn to_builder(self) -> ClientOptionsBuilder {
        ClientOptionsBuilder { options: self }
    }

    /// Load options from `AI_CLEANER_*` environment variables
    ///
    /// Unset variables keep their defaults. The state directory defaults to
    /// the platform data directory.
    ///
    /// # Errors
    /// Returns error if a numeric variable does not parse
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder().base_url(BaseUrl::resolve(
            std::env::var(ENV_URL).ok().as_deref(),
        ));

        let state_dir = std::env::var_os(ENV_STATE_DIR)
            .map(PathBuf::from)
            .or_else(default_state_dir);
        if let Some(dir) = state_dir {
            builder = builder.state_dir(dir);
        }

        if let Ok(raw) = std::env::var(ENV_LOG_CAPACITY) {
            let capacity = raw.trim().parse::<usize>().map_err(|e| {
                CleanerError::invalid_config(format!("{ENV_LOG_CAPACITY}={raw}: {e}"))
            })?;
            builder = builder.max_log_entries(capacity);
        }

        if let Ok(raw) = std::env::var(ENV_REQUEST_TIMEOUT) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                CleanerError::invalid_config(format!("{ENV_REQUEST_TIMEOUT}={raw}: {e}"))
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }
}

/// Platform data directory for persisted state
#[must_use]
pub fn default_state_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ai-cleaner").map(|dirs| dirs.data_dir().join("state"))
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for `ClientOptions`
#[derive(Debug, Default)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    /// Set the backend base URL
    #[must_use]
    pub fn base_url(mut self, base_url: BaseUrl) -> Self {
        self.options.base_url = base_url;
        self
    }

    /// Persist state under `dir`
    #[must_use]
    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.state_dir = Some(dir.into());
        self
    }

    /// Keep state in memory only
    #[must_use]
    pub fn ephemeral(mut self) -> Self {
        self.options.state_dir = None;
        self
    }

    /// Bound the activity log
    #[must_use]
    pub fn max_log_entries(mut self, max: usize) -> Self {
        self.options.max_log_entries = max;
        self
    }

    /// Per-request timeout
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = timeout;
        self
    }

    /// Push-channel reconnect backoff
    #[must_use]
    pub fn reconnect_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.options.reconnect_initial = initial;
        self.options.reconnect_max = max;
        self
    }

    /// Largest accepted push frame
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.options.max_frame_size = size;
        self
    }

    /// Build the options
    ///
    /// # Errors
    /// Returns error if a bound is zero or the backoff is inverted
    pub fn build(self) -> Result<ClientOptions> {
        let options = self.options;
        if options.request_timeout.is_zero() {
            return Err(CleanerError::invalid_config("request timeout must be positive"));
        }
        if options.max_frame_size == 0 {
            return Err(CleanerError::invalid_config("max frame size must be positive"));
        }
        if options.reconnect_initial.is_zero() || options.reconnect_initial > options.reconnect_max
        {
            return Err(CleanerError::invalid_config(
                "reconnect backoff must satisfy 0 < initial <= max",
            ));
        }
        Ok(options)
    }
}

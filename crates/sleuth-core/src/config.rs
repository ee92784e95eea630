//! Run configuration.
//!
//! Built once at process start and passed by reference into the completion
//! client and the investigation loop. Nothing here reads the environment
//! lazily.
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `ANTHROPIC_API_KEY` | Credential sent as `x-api-key` |
//! | `SLEUTH_API_URL` | Completion endpoint |
//! | `SLEUTH_API_VERSION` | `anthropic-version` header |
//! | `SLEUTH_MODEL` | Model identifier |
//! | `SLEUTH_MAX_TOKENS` | Max output size per completion |
//! | `SLEUTH_MAX_ITERATIONS` | Investigation iteration bound |
//! | `SLEUTH_WINDOW_SIZE` | Transcript turns sent per request |
//! | `SLEUTH_MEMORY_CAPACITY` | Clue entries kept verbatim in case memory |
//! | `SLEUTH_STATUS_ATTEMPTS` / `SLEUTH_STATUS_DELAY_MS` | Non-2xx budget and fixed delay |
//! | `SLEUTH_TRANSPORT_ATTEMPTS` / `SLEUTH_TRANSPORT_DELAY_MS` | Connection budget and linear base |
//! | `SLEUTH_VALIDATION_ATTEMPTS` / `SLEUTH_VALIDATION_BASE_MS` | Retry-until-valid budget and exponential base |
//! | `SLEUTH_MIN_CLUE_RELEVANCE` | Best clue score below which the referee answers with a dead end |
//! | `SLEUTH_DEBUG` | Trace full requests and responses |
//! | `SLEUTH_EXCHANGE_DIR` | File-exchange debug mode directory |
//! | `SLEUTH_LOG_DIR` | Log-capture directory |

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SleuthError, SleuthResult};
use crate::retry::RetryPolicy;

fn default_api_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

/// Retry budgets of the completion client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientRetryConfig {
    /// Attempts allowed while the endpoint answers with a non-success status.
    pub status_attempts: u32,
    /// Fixed sleep between status retries.
    pub status_delay: Duration,
    /// Attempts allowed on connection-level failures.
    pub transport_attempts: u32,
    /// Linear backoff base: the n-th transport retry sleeps `n * transport_delay`.
    pub transport_delay: Duration,
}

impl Default for ClientRetryConfig {
    fn default() -> Self {
        Self {
            status_attempts: 4,
            status_delay: Duration::from_secs(5),
            transport_attempts: 3,
            transport_delay: Duration::from_secs(1),
        }
    }
}

impl ClientRetryConfig {
    /// No sleeping at all. Handy for tests against mock servers.
    pub fn immediate() -> Self {
        Self {
            status_delay: Duration::ZERO,
            transport_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleuthConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub api_version: String,
    pub model: String,
    pub max_tokens: u32,
    pub max_iterations: u32,
    pub window_size: usize,
    pub memory_capacity: usize,
    pub min_clue_relevance: u8,
    pub client_retry: ClientRetryConfig,
    pub validation: RetryPolicy,
    pub debug: bool,
    pub exchange_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl Default for SleuthConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            api_version: default_api_version(),
            model: default_model(),
            max_tokens: 2048,
            max_iterations: 100,
            window_size: 1000,
            memory_capacity: 50,
            min_clue_relevance: 1,
            client_retry: ClientRetryConfig::default(),
            validation: RetryPolicy::default(),
            debug: false,
            exchange_dir: None,
            log_dir: None,
        }
    }
}

/// Unset means `None`; a value that does not parse is a config error.
fn env_parse<T: std::str::FromStr>(name: &str) -> SleuthResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SleuthError::config(format!("{name}: cannot parse '{raw}'"))),
        Err(_) => Ok(None),
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn env_millis(name: &str) -> SleuthResult<Option<Duration>> {
    Ok(env_parse::<u64>(name)?.map(Duration::from_millis))
}

impl SleuthConfig {
    /// Create config from environment variables (see module docs).
    ///
    /// Unset variables keep their defaults; malformed numbers are rejected.
    pub fn from_env() -> SleuthResult<Self> {
        let defaults = Self::default();

        let client_retry = ClientRetryConfig {
            status_attempts: env_parse("SLEUTH_STATUS_ATTEMPTS")?
                .unwrap_or(defaults.client_retry.status_attempts),
            status_delay: env_millis("SLEUTH_STATUS_DELAY_MS")?
                .unwrap_or(defaults.client_retry.status_delay),
            transport_attempts: env_parse("SLEUTH_TRANSPORT_ATTEMPTS")?
                .unwrap_or(defaults.client_retry.transport_attempts),
            transport_delay: env_millis("SLEUTH_TRANSPORT_DELAY_MS")?
                .unwrap_or(defaults.client_retry.transport_delay),
        };

        let validation = RetryPolicy {
            max_attempts: env_parse("SLEUTH_VALIDATION_ATTEMPTS")?
                .unwrap_or(defaults.validation.max_attempts),
            base_delay: env_millis("SLEUTH_VALIDATION_BASE_MS")?
                .unwrap_or(defaults.validation.base_delay),
        };

        Ok(Self {
            api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            api_url: std::env::var("SLEUTH_API_URL").unwrap_or(defaults.api_url),
            api_version: std::env::var("SLEUTH_API_VERSION").unwrap_or(defaults.api_version),
            model: std::env::var("SLEUTH_MODEL").unwrap_or(defaults.model),
            max_tokens: env_parse("SLEUTH_MAX_TOKENS")?.unwrap_or(defaults.max_tokens),
            max_iterations: env_parse("SLEUTH_MAX_ITERATIONS")?.unwrap_or(defaults.max_iterations),
            window_size: env_parse("SLEUTH_WINDOW_SIZE")?.unwrap_or(defaults.window_size),
            memory_capacity: env_parse("SLEUTH_MEMORY_CAPACITY")?
                .unwrap_or(defaults.memory_capacity),
            min_clue_relevance: env_parse("SLEUTH_MIN_CLUE_RELEVANCE")?
                .unwrap_or(defaults.min_clue_relevance),
            client_retry,
            validation,
            debug: env_flag("SLEUTH_DEBUG"),
            exchange_dir: std::env::var("SLEUTH_EXCHANGE_DIR").ok().map(PathBuf::from),
            log_dir: std::env::var("SLEUTH_LOG_DIR").ok().map(PathBuf::from),
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_window_size(mut self, n: usize) -> Self {
        self.window_size = n;
        self
    }

    pub fn with_memory_capacity(mut self, n: usize) -> Self {
        self.memory_capacity = n;
        self
    }

    pub fn with_client_retry(mut self, retry: ClientRetryConfig) -> Self {
        self.client_retry = retry;
        self
    }

    pub fn with_validation(mut self, policy: RetryPolicy) -> Self {
        self.validation = policy;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_exchange_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exchange_dir = Some(dir.into());
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Reject budgets that would make the run meaningless.
    ///
    /// The API key is only required when requests actually go over the
    /// network, i.e. when no exchange directory is configured.
    pub fn validate(&self) -> SleuthResult<()> {
        if self.max_iterations == 0 {
            return Err(SleuthError::config("max_iterations must be at least 1"));
        }
        if self.window_size == 0 {
            return Err(SleuthError::config("window_size must be at least 1"));
        }
        if self.memory_capacity == 0 {
            return Err(SleuthError::config("memory_capacity must be at least 1"));
        }
        if self.client_retry.status_attempts == 0 || self.client_retry.transport_attempts == 0 {
            return Err(SleuthError::config("client retry budgets must be at least 1"));
        }
        if self.validation.max_attempts == 0 {
            return Err(SleuthError::config(
                "validation max_attempts must be at least 1",
            ));
        }
        if self.exchange_dir.is_none() && self.api_key.is_none() {
            return Err(SleuthError::config(
                "ANTHROPIC_API_KEY is not set (or use an exchange directory for offline runs)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "ANTHROPIC_API_KEY",
        "SLEUTH_MODEL",
        "SLEUTH_MAX_ITERATIONS",
        "SLEUTH_STATUS_DELAY_MS",
        "SLEUTH_VALIDATION_ATTEMPTS",
        "SLEUTH_DEBUG",
        "SLEUTH_EXCHANGE_DIR",
    ];

    fn clear() {
        for v in VARS {
            std::env::remove_var(v);
        }
    }

    #[test]
    #[serial]
    fn from_env_defaults() {
        clear();
        let cfg = SleuthConfig::from_env().unwrap();
        assert_eq!(cfg.model, "claude-3-haiku-20240307");
        assert_eq!(cfg.max_iterations, 100);
        assert_eq!(cfg.client_retry.status_attempts, 4);
        assert!(!cfg.debug);
        assert!(cfg.exchange_dir.is_none());
    }

    #[test]
    #[serial]
    fn from_env_overrides() {
        clear();
        std::env::set_var("ANTHROPIC_API_KEY", "sk-test");
        std::env::set_var("SLEUTH_MODEL", "claude-test");
        std::env::set_var("SLEUTH_MAX_ITERATIONS", "7");
        std::env::set_var("SLEUTH_STATUS_DELAY_MS", "20");
        std::env::set_var("SLEUTH_VALIDATION_ATTEMPTS", "5");
        std::env::set_var("SLEUTH_DEBUG", "true");

        let cfg = SleuthConfig::from_env().unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.model, "claude-test");
        assert_eq!(cfg.max_iterations, 7);
        assert_eq!(cfg.client_retry.status_delay, Duration::from_millis(20));
        assert_eq!(cfg.validation.max_attempts, 5);
        assert!(cfg.debug);

        clear();
    }

    #[test]
    #[serial]
    fn malformed_number_is_a_config_error() {
        clear();
        std::env::set_var("SLEUTH_MAX_ITERATIONS", "abc");

        let err = SleuthConfig::from_env().unwrap_err();
        assert!(matches!(err, SleuthError::Config { .. }));
        assert!(err.to_string().contains("SLEUTH_MAX_ITERATIONS"));
        assert_eq!(err.exit_code(), 2);

        clear();
    }

    #[test]
    fn validate_requires_key_for_live_runs() {
        let cfg = SleuthConfig::default();
        assert!(matches!(cfg.validate(), Err(SleuthError::Config { .. })));

        let cfg = SleuthConfig::default().with_api_key("sk-test");
        assert!(cfg.validate().is_ok());

        let cfg = SleuthConfig::default().with_exchange_dir("/tmp/exchange");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_budgets() {
        let cfg = SleuthConfig::default()
            .with_api_key("k")
            .with_max_iterations(0);
        assert!(cfg.validate().is_err());

        let cfg = SleuthConfig::default()
            .with_api_key("k")
            .with_validation(RetryPolicy {
                max_attempts: 0,
                base_delay: Duration::ZERO,
            });
        assert!(cfg.validate().is_err());
    }
}

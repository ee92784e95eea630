//! Retry-until-valid controller.
//!
//! The model's output format is not guaranteed, so every structured reply in
//! the system goes through [`get_validated`]: ask, check, and ask again with
//! exponential backoff until the reply is accepted or the budget runs out.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SleuthError, SleuthResult};
use crate::providers::llm::{CompletionRequest, LlmClient};

/// Attempt budget and backoff law: attempt `n` (0-based) that fails sleeps
/// `base_delay * 2^n` before the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// No sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(31)))
    }
}

/// An accepted reply together with the raw text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub raw: String,
    pub attempts: u32,
}

/// Send `request` until `accept` passes and `transform` yields a value.
///
/// - the client is called at most `policy.max_attempts` times;
/// - a rejected attempt `n` sleeps `policy.delay_for(n)` unless it was the last;
/// - client errors are not retried here, they propagate as they are;
/// - running out of attempts yields [`SleuthError::ValidationExhausted`].
pub async fn get_validated<T, A, F>(
    client: &dyn LlmClient,
    request: &CompletionRequest,
    what: &str,
    accept: A,
    transform: F,
    policy: &RetryPolicy,
) -> SleuthResult<Validated<T>>
where
    A: Fn(&str) -> bool,
    F: Fn(&str) -> Option<T>,
{
    let mut last_response = None;

    for attempt in 0..policy.max_attempts {
        let response = client.complete(request).await?;
        let text = response.text;

        if accept(&text) {
            if let Some(value) = transform(&text) {
                debug!(what, attempt = attempt + 1, "accepted response");
                return Ok(Validated {
                    value,
                    raw: text,
                    attempts: attempt + 1,
                });
            }
        }

        last_response = Some(text);
        if attempt + 1 < policy.max_attempts {
            let backoff = policy.delay_for(attempt);
            warn!(
                what,
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                backoff_ms = backoff.as_millis(),
                "response rejected, retrying"
            );
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
        }
    }

    Err(SleuthError::ValidationExhausted {
        what: what.to_string(),
        attempts: policy.max_attempts,
        last_response,
    })
}

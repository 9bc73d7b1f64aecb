//! Retry policy for the request executor
//!
//! Delays grow exponentially from `base_delay` and saturate at `max_delay`.
//! Jitter spreads concurrent clients apart after a shared outage.

use evnex_core::EvnexError;
use rand::Rng;
use std::time::Duration;

/// Randomisation applied to the backoff ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Sleep exactly the ceiling
    None,
    /// Uniform in `[ceiling / 2, ceiling]`
    #[default]
    Equal,
    /// Uniform in `[0, ceiling]`
    Full,
}

impl Jitter {
    fn apply(&self, ceiling: Duration) -> Duration {
        let ceiling_ms = ceiling.as_millis() as u64;
        match self {
            Jitter::None => ceiling,
            Jitter::Equal => {
                let half = ceiling_ms / 2;
                Duration::from_millis(half + rand::thread_rng().gen_range(0..=ceiling_ms - half))
            }
            Jitter::Full => Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling_ms)),
        }
    }
}

/// Predicate deciding whether an error is worth another attempt
pub type RetryPredicate = fn(&EvnexError) -> bool;

/// Backoff and retry settings applied around a single request attempt
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Total attempts including the first; `None` retries until success or
    /// cancellation
    pub max_attempts: Option<u32>,
    pub jitter: Jitter,
    pub retry_on: RetryPredicate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_attempts: None,
            jitter: Jitter::default(),
            retry_on: EvnexError::is_transient,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: Some(1),
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_predicate(mut self, retry_on: RetryPredicate) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Upper bound of the delay after the zero-based `attempt` failed
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Jittered delay after the zero-based `attempt` failed
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.jitter.apply(self.ceiling(attempt))
    }

    /// Whether another attempt should follow the zero-based `attempt` that
    /// failed with `error`
    pub fn should_retry(&self, error: &EvnexError, attempt: u32) -> bool {
        if !(self.retry_on)(error) {
            return false;
        }
        match self.max_attempts {
            Some(max) => attempt + 1 < max,
            None => true,
        }
    }

    /// Check the delays are usable
    pub fn validate(&self) -> Result<(), String> {
        if self.base_delay.is_zero() {
            return Err("retry base delay must be greater than zero".to_string());
        }
        if self.base_delay > self.max_delay {
            return Err(format!(
                "retry base delay {:?} exceeds the cap {:?}",
                self.base_delay, self.max_delay
            ));
        }
        if self.max_attempts == Some(0) {
            return Err("max attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

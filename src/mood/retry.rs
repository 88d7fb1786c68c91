//! Retry policy for mood polling

use std::time::Duration;

/// How long to wait between two attempts
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// The same delay after every failed attempt
    Fixed(Duration),
    /// `initial * factor^(n-1)` after the n-th failed attempt, capped at `max`
    Exponential {
        initial: Duration,
        factor: f64,
        max: Duration,
    },
}

/// Bounded retry budget.
///
/// The default is ten attempts with a flat two second delay, a twenty second
/// worst case before giving up.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(10, Duration::from_millis(2000))
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn exponential(max_attempts: u32, initial: Duration, factor: f64, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                initial,
                factor,
                max,
            },
        }
    }

    /// Delay to wait after the failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential {
                initial,
                factor,
                max,
            } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let millis = initial.as_millis() as f64 * factor.powi(exponent);
                if !millis.is_finite() || millis >= max.as_millis() as f64 {
                    *max
                } else {
                    Duration::from_millis(millis as u64)
                }
            }
        }
    }

    /// Whether another attempt is allowed after `attempt` attempts
    pub fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

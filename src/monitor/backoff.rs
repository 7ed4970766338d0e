//! Backoff policy for failed status polls.

use std::time::Duration;

/// Capped exponential backoff between failed poll attempts.
///
/// A failing device is retried forever (stopping the whole monitor is the
/// only cancellation), so unlike a request retry policy there is no attempt
/// cap; only the delay between attempts is bounded.
///
/// # Defaults
///
/// - `initial_delay`: 2 seconds
/// - `max_delay`: 30 seconds
/// - `multiplier`: 2.0
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt.
    ///
    /// Subsequent delays are computed by multiplying by `multiplier`.
    pub initial_delay: Duration,

    /// Maximum delay between attempts.
    ///
    /// The computed delay is capped at this value so an offline device is
    /// still re-probed at a useful rate.
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each further failure.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Default initial delay (2 seconds).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(2);

    /// Default maximum delay (30 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

    /// Default multiplier (2.0).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    /// Creates a new backoff policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }

    /// Sets the delay after the first failure.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between attempts.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is not positive (must be > 0.0).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "multiplier must be positive");
        self.multiplier = multiplier;
        self
    }

    /// Computes the delay before the next attempt after `failures`
    /// consecutive failures (`failures >= 1`).
    ///
    /// One failure yields `initial_delay`; each further failure multiplies
    /// the delay, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_failures(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1);
        // Safe cast: exponents are small and i32::MAX is ~2 billion
        #[allow(clippy::cast_possible_wrap)]
        let multiplier = self.multiplier.powi(exponent.min(63) as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

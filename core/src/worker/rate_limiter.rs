//! Rate limiting for new remote sessions

use std::time::Duration;

use governor::{Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::NotKeyed};

/// Caps how fast new remote sessions are opened across the whole fleet
///
/// sshd throttles bursts of unauthenticated connections (`MaxStartups`), and a
/// large host list fanned out at once can trip it. One instance is shared by
/// every worker through an `Arc`.
pub struct ConnectRateLimiter {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    rate: Option<f64>,
}

impl ConnectRateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `rate` - Optional sessions per second. None (or a non-positive value)
    ///   disables rate limiting. Fractional rates are honoured, so `0.5`
    ///   opens one session every two seconds.
    ///
    /// # Examples
    /// ```
    /// use candia_core::worker::ConnectRateLimiter;
    ///
    /// let limiter = ConnectRateLimiter::new(Some(10.0));
    /// assert!(limiter.is_enabled());
    ///
    /// let unlimited = ConnectRateLimiter::new(None);
    /// assert!(!unlimited.is_enabled());
    /// ```
    pub fn new(rate: Option<f64>) -> Self {
        let limiter = rate
            .and_then(session_period)
            .and_then(Quota::with_period)
            .map(RateLimiter::direct);

        Self { limiter, rate }
    }

    /// Create an unlimited rate limiter
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Wait until a new session is allowed
    ///
    /// Returns immediately if no rate limit is configured.
    pub async fn wait(&self) {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }
}

/// Gap between two sessions at `rate` per second
///
/// `None` when the rate is not positive or the gap does not fit a non-zero
/// [`Duration`].
pub fn session_period(rate: f64) -> Option<Duration> {
    if !(rate > 0.0 && rate.is_finite()) {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / rate)
        .ok()
        .filter(|period| !period.is_zero())
}

impl Default for ConnectRateLimiter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for ConnectRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectRateLimiter")
            .field("rate", &self.rate)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

//! Spacing between calls to an external service, with adaptive backoff.
//!
//! YouTube throttles clients that search in quick succession; the batch
//! pipeline waits here before every search.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

/// Enforces a minimum interval between requests.  Failures double the
/// interval (up to a maximum), runs of successes halve it again.
pub struct RateLimiter {
    name: String,
    last_request: Option<Instant>,
    current_interval: Duration,
    base_interval: Duration,
    max_interval: Duration,
    success_count: u32,
    successes_to_reduce: u32,
}

impl RateLimiter {
    /// * `name` — label for log messages
    /// * `base_interval` — minimum time between requests
    /// * `max_interval` — upper bound after repeated failures
    /// * `successes_to_reduce` — consecutive successes before halving
    ///   (0 disables the reduction)
    pub fn new(name: &str, base_interval: Duration, max_interval: Duration, successes_to_reduce: u32) -> Self {
        RateLimiter {
            name: name.to_string(),
            last_request: None,
            current_interval: base_interval,
            base_interval,
            max_interval,
            success_count: 0,
            successes_to_reduce,
        }
    }

    /// Base interval in (fractional) seconds; max is 16× base, reduced after
    /// 10 successes.  Zero or negative values disable waiting altogether;
    /// values too large for a `Duration` saturate.
    pub fn from_secs_f64(name: &str, secs: f64) -> Self {
        let base = if secs.is_nan() || secs <= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        };
        Self::new(name, base, base.saturating_mul(16), 10)
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Sleep until the interval since the previous request has elapsed.
    /// Call right before making a request.
    pub fn wait_if_needed(&mut self) {
        if let Some(wait) = self.pending_wait() {
            info!("[{}] Rate limiting: waiting {:.1}s...", self.name, wait.as_secs_f64());
            thread::sleep(wait);
        }
        self.last_request = Some(Instant::now());
    }

    fn pending_wait(&self) -> Option<Duration> {
        let last = self.last_request?;
        let elapsed = last.elapsed();
        if elapsed < self.current_interval {
            Some(self.current_interval - elapsed)
        } else {
            None
        }
    }

    pub fn report_success(&mut self) {
        if self.successes_to_reduce == 0 {
            return;
        }

        self.success_count += 1;

        if self.success_count >= self.successes_to_reduce && self.current_interval > self.base_interval {
            self.current_interval = (self.current_interval / 2).max(self.base_interval);
            debug!(
                "[{}] Rate limit reduced to {:.1}s after {} successes",
                self.name,
                self.current_interval.as_secs_f64(),
                self.success_count
            );
            self.success_count = 0;
        }
    }

    pub fn report_failure(&mut self) {
        self.current_interval = self.current_interval.saturating_mul(2).min(self.max_interval);
        debug!(
            "[{}] Rate limit increased to {:.1}s due to error",
            self.name,
            self.current_interval.as_secs_f64()
        );
        self.success_count = 0;
    }
}

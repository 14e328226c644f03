//! Rate limiting for repeated warnings using the governor crate

use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default window: a given message is logged at most once per hour.
pub const DEFAULT_WARN_WINDOW: Duration = Duration::from_secs(3600);

/// Lets each distinct message through at most once per window.
pub struct WarnLimiter {
    limiter: Arc<RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>>,
    /// Number of messages let through so far
    emitted: Arc<AtomicU64>,
}

impl WarnLimiter {
    /// Create a limiter with the given window (zero falls back to the default)
    pub fn new(window: Duration) -> Self {
        let quota = Quota::with_period(window).unwrap_or_else(|| Quota::per_hour(NonZeroU32::MIN));

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            emitted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns true if `message` should be logged now
    pub fn should_log(&self, message: &str) -> bool {
        let allowed = self.limiter.check_key(&message.to_string()).is_ok();
        if allowed {
            self.emitted.fetch_add(1, Ordering::Relaxed);
            // Messages come from callers; drop keys whose window has passed.
            self.limiter.retain_recent();
        }
        allowed
    }

    /// Distinct messages still inside their window
    pub fn tracked(&self) -> usize {
        self.limiter.len()
    }

    /// Log `message` at warn level unless it was logged within the window
    pub fn warn(&self, message: &str) {
        if self.should_log(message) {
            tracing::warn!("{}", message);
        }
    }

    /// How many messages have been let through
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl Default for WarnLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_WINDOW)
    }
}

impl Clone for WarnLimiter {
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.clone(),
            emitted: self.emitted.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_message_logged_once() {
        let limiter = WarnLimiter::default();

        assert!(limiter.should_log("Ignoring unknown event FOO"));
        for _ in 0..100 {
            assert!(!limiter.should_log("Ignoring unknown event FOO"));
        }
        assert_eq!(limiter.emitted(), 1);
    }

    #[test]
    fn test_distinct_messages_tracked_separately() {
        let limiter = WarnLimiter::default();

        limiter.warn("Ignoring unknown event FOO");
        limiter.warn("Ignoring unknown event BAR");
        limiter.warn("Ignoring unknown event FOO");

        assert_eq!(limiter.emitted(), 2);
    }

    #[test]
    fn test_window_expires() {
        let limiter = WarnLimiter::new(Duration::from_millis(20));

        assert!(limiter.should_log("msg"));
        assert!(!limiter.should_log("msg"));
        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.should_log("msg"));
    }

    #[test]
    fn test_expired_messages_are_forgotten() {
        let limiter = WarnLimiter::new(Duration::from_millis(20));

        for name in ["A", "B", "C"] {
            limiter.warn(&format!("Ignoring unknown event {name}"));
        }
        assert_eq!(limiter.tracked(), 3);

        std::thread::sleep(Duration::from_millis(60));
        limiter.warn("Ignoring unknown event D");
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_zero_window_uses_default() {
        let limiter = WarnLimiter::new(Duration::ZERO);
        assert!(limiter.should_log("msg"));
        assert!(!limiter.should_log("msg"));
    }

    #[test]
    fn test_clones_share_state() {
        let limiter = WarnLimiter::default();
        let other = limiter.clone();

        assert!(limiter.should_log("msg"));
        assert!(!other.should_log("msg"));
        assert_eq!(other.emitted(), 1);
    }
}

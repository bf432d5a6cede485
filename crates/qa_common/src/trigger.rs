//! Trigger Limiter v0.3.0
//!
//! Cooldown gate for keyword suggestion replies. A keyword may fire again
//! only after the cooldown window has elapsed since it last fired.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Default cooldown window
pub const DEFAULT_COOLDOWN_SECS: i64 = 300;

#[derive(Debug)]
pub struct TriggerLimiter {
    /// Keyword -> last time it fired
    last_triggered: Mutex<HashMap<String, DateTime<Utc>>>,
    cooldown: Duration,
}

impl TriggerLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_triggered: Mutex::new(HashMap::new()),
            cooldown,
        }
    }

    fn state(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        // Timestamps stay valid even if a holder panicked
        self.last_triggered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check-and-set: true (and record `now`) iff the keyword is not cooling down
    pub fn allow(&self, keyword: &str, now: DateTime<Utc>) -> bool {
        let mut state = self.state();

        if let Some(last) = state.get(keyword) {
            if now.signed_duration_since(*last) < self.cooldown {
                return false;
            }
        }

        state.insert(keyword.to_string(), now);
        true
    }

    /// Drop keywords whose cooldown has expired
    pub fn cleanup(&self, now: DateTime<Utc>) {
        let cooldown = self.cooldown;
        self.state()
            .retain(|_, last| now.signed_duration_since(*last) < cooldown);
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Keywords currently tracked (for monitoring)
    pub fn len(&self) -> usize {
        self.state().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().is_empty()
    }
}

impl Default for TriggerLimiter {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_cooldown_window() {
        let limiter = TriggerLimiter::default();
        assert!(limiter.allow("帮助", at(0)));
        assert!(!limiter.allow("帮助", at(100)));
        assert!(limiter.allow("帮助", at(301)));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let limiter = TriggerLimiter::default();
        assert!(limiter.allow("k", at(0)));
        assert!(!limiter.allow("k", at(299)));
        assert!(limiter.allow("k", at(300)));
    }

    #[test]
    fn test_denied_call_does_not_extend_window() {
        let limiter = TriggerLimiter::default();
        assert!(limiter.allow("k", at(0)));
        assert!(!limiter.allow("k", at(250)));
        // Window still measured from t=0
        assert!(limiter.allow("k", at(300)));
    }

    #[test]
    fn test_keywords_are_independent() {
        let limiter = TriggerLimiter::default();
        assert!(limiter.allow("a", at(0)));
        assert!(limiter.allow("b", at(1)));
        assert!(!limiter.allow("a", at(2)));
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn test_cleanup() {
        let limiter = TriggerLimiter::default();
        limiter.allow("old", at(0));
        limiter.allow("recent", at(200));

        limiter.cleanup(at(400));
        assert_eq!(limiter.len(), 1);
        assert!(!limiter.allow("recent", at(400)));
        assert!(limiter.allow("old", at(400)));
    }

    #[test]
    fn test_concurrent_allow_fires_once() {
        let limiter = Arc::new(TriggerLimiter::default());
        let allowed = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|scope| {
            for _ in 0..16 {
                let limiter = Arc::clone(&limiter);
                let allowed = Arc::clone(&allowed);
                scope.spawn(move || {
                    if limiter.allow("帮助", at(0)) {
                        allowed.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(allowed.load(Ordering::SeqCst), 1);
    }
}

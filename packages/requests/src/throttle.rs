use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Idle keys are pruned once per this many checks.
const PRUNE_INTERVAL: usize = 1024;

/// Throttle configuration for form submissions
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub enabled: bool,
    pub submissions_per_minute: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            submissions_per_minute: 3,
        }
    }
}

/// Best-effort submission throttle keyed by submitter email.
///
/// State is process-local: it does not survive restarts and does not
/// coordinate across instances.
pub struct SubmissionThrottle {
    config: ThrottleConfig,
    limiter: KeyedLimiter,
    checks: AtomicUsize,
}

impl SubmissionThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        let per_minute = NonZeroU32::new(config.submissions_per_minute)
            .unwrap_or_else(|| NonZeroU32::new(1).expect("1 is non-zero"));
        let limiter = RateLimiter::keyed(Quota::per_minute(per_minute));
        Self {
            config,
            limiter,
            checks: AtomicUsize::new(0),
        }
    }

    /// Returns whether a submission from this email is admitted right now.
    pub fn check(&self, email: &str) -> bool {
        if !self.config.enabled {
            return true;
        }

        // The keyed store grows with every distinct email; drop entries
        // that have aged out so it stays bounded.
        let checks = self.checks.fetch_add(1, Ordering::Relaxed);
        if checks % PRUNE_INTERVAL == PRUNE_INTERVAL - 1 {
            self.limiter.retain_recent();
        }

        let key = email.trim().to_lowercase();
        let admitted = self.limiter.check_key(&key).is_ok();
        if !admitted {
            warn!("Submission throttled for {}", key);
        }
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(per_minute: u32) -> SubmissionThrottle {
        SubmissionThrottle::new(ThrottleConfig {
            enabled: true,
            submissions_per_minute: per_minute,
        })
    }

    #[test]
    fn test_first_submission_passes_immediate_repeat_rejected() {
        let throttle = throttle(1);
        assert!(throttle.check("u1@example.com"));
        assert!(!throttle.check("u1@example.com"));
    }

    #[test]
    fn test_emails_are_throttled_independently() {
        let throttle = throttle(1);
        assert!(throttle.check("u1@example.com"));
        assert!(throttle.check("u2@example.com"));
    }

    #[test]
    fn test_email_key_is_normalized() {
        let throttle = throttle(1);
        assert!(throttle.check("U1@Example.com "));
        assert!(!throttle.check("u1@example.com"));
    }

    #[test]
    fn test_pruning_pass_keeps_limiter_functional() {
        let throttle = throttle(1);
        for i in 0..(PRUNE_INTERVAL * 2) {
            assert!(throttle.check(&format!("u{}@example.com", i)));
        }

        // Active keys still throttle after the store has been pruned
        assert!(throttle.check("fresh@example.com"));
        assert!(!throttle.check("fresh@example.com"));
    }

    #[test]
    fn test_disabled_throttle_admits_everything() {
        let throttle = SubmissionThrottle::new(ThrottleConfig {
            enabled: false,
            submissions_per_minute: 1,
        });
        assert!(throttle.check("u1@example.com"));
        assert!(throttle.check("u1@example.com"));
        assert!(throttle.check("u1@example.com"));
    }
}

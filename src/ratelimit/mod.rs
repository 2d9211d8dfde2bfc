//! Fixed-window rate limiting and failed-login tracking.
//!
//! Flow Overview:
//! 1) Key requests by (client identity, resource path); each key owns one
//!    counting window.
//! 2) Within a live window, requests past the limit are rejected hard; no
//!    queuing, no delay-then-retry.
//! 3) A request after the window end resets the key to a fresh window.
//!
//! Expired windows are evicted whenever a new key is inserted, so the table
//! stays bounded under churn instead of leaking one entry per distinct key.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// Quota metadata attached to every handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuota {
    pub limit: u32,
    /// Requests left in the current window, clamped to zero.
    pub remaining: u32,
    /// Unix-epoch seconds at which the current window ends.
    pub reset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed(RateQuota),
    Limited(RateQuota),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    client: String,
    path: String,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    window_start: u64,
}

/// Current unix time in seconds; clock-before-epoch degrades to zero.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Per-(client, path) fixed-window request limiter.
#[derive(Debug)]
pub struct WindowLimiter {
    limit: u32,
    window_secs: u64,
    windows: Mutex<HashMap<WindowKey, Window>>,
}

impl WindowLimiter {
    #[must_use]
    pub fn new(limit: u32, window_secs: u64) -> Self {
        Self {
            limit,
            window_secs,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Register a request and decide whether it may proceed.
    pub async fn check(&self, client: &str, path: &str) -> RateDecision {
        self.check_at(client, path, unix_now()).await
    }

    pub(crate) async fn check_at(&self, client: &str, path: &str, now: u64) -> RateDecision {
        let key = WindowKey {
            client: client.to_string(),
            path: path.to_string(),
        };
        let mut windows = self.windows.lock().await;

        if let Some(window) = windows.get_mut(&key) {
            if now < window.window_start + self.window_secs {
                if window.count >= self.limit {
                    return RateDecision::Limited(self.quota(window.count, window.window_start));
                }
                window.count += 1;
                return RateDecision::Allowed(self.quota(window.count, window.window_start));
            }
            *window = Window {
                count: 1,
                window_start: now,
            };
            return RateDecision::Allowed(self.quota(1, now));
        }

        // First request for this key: sweep expired windows before inserting
        // so the table only holds live entries.
        windows.retain(|_, window| now < window.window_start + self.window_secs);
        windows.insert(
            key,
            Window {
                count: 1,
                window_start: now,
            },
        );
        RateDecision::Allowed(self.quota(1, now))
    }

    fn quota(&self, count: u32, window_start: u64) -> RateQuota {
        RateQuota {
            limit: self.limit,
            remaining: self.limit.saturating_sub(count),
            reset: window_start + self.window_secs,
        }
    }
}

/// Outcome of a failed-login lockout check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginGate {
    Allowed { remaining_attempts: u32 },
    Locked { retry_after_secs: u64 },
}

/// Failed-login tracker with a lockout window per key (normalized username).
///
/// Counts only failures: a successful login clears the key. Once the failure
/// count reaches the limit, further attempts are refused until the window
/// expires.
#[derive(Debug)]
pub struct AttemptTracker {
    max_attempts: u32,
    lockout_secs: u64,
    failures: Mutex<HashMap<String, Window>>,
}

impl AttemptTracker {
    #[must_use]
    pub fn new(max_attempts: u32, lockout_secs: u64) -> Self {
        Self {
            max_attempts,
            lockout_secs,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether a login attempt for `key` may proceed.
    pub async fn check(&self, key: &str) -> LoginGate {
        self.check_at(key, unix_now()).await
    }

    pub(crate) async fn check_at(&self, key: &str, now: u64) -> LoginGate {
        let mut failures = self.failures.lock().await;
        match failures.get(key) {
            Some(window) if now < window.window_start + self.lockout_secs => {
                if window.count >= self.max_attempts {
                    LoginGate::Locked {
                        retry_after_secs: window.window_start + self.lockout_secs - now,
                    }
                } else {
                    LoginGate::Allowed {
                        remaining_attempts: self.max_attempts - window.count,
                    }
                }
            }
            Some(_) => {
                failures.remove(key);
                LoginGate::Allowed {
                    remaining_attempts: self.max_attempts,
                }
            }
            None => LoginGate::Allowed {
                remaining_attempts: self.max_attempts,
            },
        }
    }

    /// Record a failed login for `key`.
    pub async fn record_failure(&self, key: &str) {
        self.record_failure_at(key, unix_now()).await;
    }

    pub(crate) async fn record_failure_at(&self, key: &str, now: u64) {
        let mut failures = self.failures.lock().await;
        match failures.get_mut(key) {
            Some(window) if now < window.window_start + self.lockout_secs => {
                window.count += 1;
            }
            _ => {
                failures.retain(|_, window| now < window.window_start + self.lockout_secs);
                failures.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        window_start: now,
                    },
                );
            }
        }
    }

    /// Clear the failure record after a successful login.
    pub async fn record_success(&self, key: &str) {
        let mut failures = self.failures.lock().await;
        failures.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn window_counts_and_rejects_then_resets() {
        let limiter = WindowLimiter::new(3, 60);

        for (t, remaining) in [(0, 2), (1, 1), (2, 0)] {
            let decision = limiter.check_at("10.0.0.1", "/v1/quotes", t).await;
            let RateDecision::Allowed(quota) = decision else {
                panic!("request at t={t} should be allowed");
            };
            assert_eq!(quota.remaining, remaining);
            assert_eq!(quota.limit, 3);
            assert_eq!(quota.reset, 60);
        }

        let decision = limiter.check_at("10.0.0.1", "/v1/quotes", 3).await;
        assert!(matches!(decision, RateDecision::Limited(_)));

        // New window after the reset point.
        let decision = limiter.check_at("10.0.0.1", "/v1/quotes", 61).await;
        let RateDecision::Allowed(quota) = decision else {
            panic!("request in the new window should be allowed");
        };
        assert_eq!(quota.remaining, 2);
        assert_eq!(quota.reset, 121);
    }

    #[tokio::test]
    async fn limited_quota_remaining_is_clamped_to_zero() {
        let limiter = WindowLimiter::new(1, 60);
        let _ = limiter.check_at("c", "/p", 0).await;
        let RateDecision::Limited(quota) = limiter.check_at("c", "/p", 1).await else {
            panic!("second request should be limited");
        };
        assert_eq!(quota.remaining, 0);
    }

    #[tokio::test]
    async fn distinct_keys_never_share_quota() {
        let limiter = WindowLimiter::new(1, 60);
        assert!(matches!(
            limiter.check_at("10.0.0.1", "/a", 0).await,
            RateDecision::Allowed(_)
        ));
        // Same client, different path.
        assert!(matches!(
            limiter.check_at("10.0.0.1", "/b", 0).await,
            RateDecision::Allowed(_)
        ));
        // Different client, same path.
        assert!(matches!(
            limiter.check_at("10.0.0.2", "/a", 0).await,
            RateDecision::Allowed(_)
        ));
        // But the original key is now exhausted.
        assert!(matches!(
            limiter.check_at("10.0.0.1", "/a", 1).await,
            RateDecision::Limited(_)
        ));
    }

    #[tokio::test]
    async fn expired_windows_are_evicted_on_new_key_insert() {
        let limiter = WindowLimiter::new(3, 60);
        let _ = limiter.check_at("old", "/p", 0).await;
        let _ = limiter.check_at("fresh", "/p", 120).await;
        let windows = limiter.windows.lock().await;
        assert_eq!(windows.len(), 1, "expired window should have been swept");
    }

    #[tokio::test]
    async fn lockout_after_max_failures_with_retry_metadata() {
        let tracker = AttemptTracker::new(5, 1800);
        for t in 0..5 {
            tracker.record_failure_at("alice", t).await;
        }
        let gate = tracker.check_at("alice", 10).await;
        assert_eq!(
            gate,
            LoginGate::Locked {
                retry_after_secs: 1790
            }
        );
    }

    #[tokio::test]
    async fn failures_below_the_limit_report_remaining_attempts() {
        let tracker = AttemptTracker::new(5, 1800);
        tracker.record_failure_at("bob", 0).await;
        tracker.record_failure_at("bob", 1).await;
        assert_eq!(
            tracker.check_at("bob", 2).await,
            LoginGate::Allowed {
                remaining_attempts: 3
            }
        );
    }

    #[tokio::test]
    async fn success_clears_the_failure_record() {
        let tracker = AttemptTracker::new(2, 1800);
        tracker.record_failure_at("carol", 0).await;
        tracker.record_success("carol").await;
        assert_eq!(
            tracker.check_at("carol", 1).await,
            LoginGate::Allowed {
                remaining_attempts: 2
            }
        );
    }

    #[tokio::test]
    async fn lockout_expires_with_the_window() {
        let tracker = AttemptTracker::new(2, 60);
        tracker.record_failure_at("dave", 0).await;
        tracker.record_failure_at("dave", 1).await;
        assert!(matches!(
            tracker.check_at("dave", 30).await,
            LoginGate::Locked { .. }
        ));
        assert_eq!(
            tracker.check_at("dave", 61).await,
            LoginGate::Allowed {
                remaining_attempts: 2
            }
        );
    }
}

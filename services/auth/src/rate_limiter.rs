//! Sign-in throttling against password guessing

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed attempts tolerated within the window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Lockout duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,
            ban_duration_seconds: 900,
        }
    }
}

#[derive(Debug)]
struct Attempts {
    count: u32,
    window_start: Instant,
    banned_until: Option<Instant>,
}

/// Counts sign-in attempts per key and locks the key out past the limit
///
/// An attempt is counted when it starts and forgotten when it succeeds, so
/// concurrent guesses can never run past `max_attempts`.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, Attempts>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a sign-in attempt for `key`; false when `key` is locked out
    pub async fn try_attempt(&self, key: &str) -> bool {
        self.try_attempt_at(key, Instant::now()).await
    }

    async fn try_attempt_at(&self, key: &str, now: Instant) -> bool {
        let window = Duration::from_secs(self.config.window_seconds);
        let mut entries = self.entries.lock().await;

        let entry = entries.entry(key.to_string()).or_insert(Attempts {
            count: 0,
            window_start: now,
            banned_until: None,
        });

        match entry.banned_until {
            Some(until) if now < until => return false,
            Some(_) => {
                entry.count = 0;
                entry.window_start = now;
                entry.banned_until = None;
            }
            None if now.duration_since(entry.window_start) >= window => {
                entry.count = 0;
                entry.window_start = now;
            }
            None => {}
        }

        entry.count += 1;
        if entry.count >= self.config.max_attempts {
            entry.banned_until = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Locked out {} for {} seconds after {} sign-in attempts",
                key, self.config.ban_duration_seconds, entry.count
            );
        }

        true
    }

    /// Forget the attempts recorded for `key`
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    /// Drop keys whose window and lockout have both ended; returns how many
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now()).await
    }

    async fn purge_expired_at(&self, now: Instant) -> usize {
        let window = Duration::from_secs(self.config.window_seconds);
        let mut entries = self.entries.lock().await;
        let before = entries.len();

        entries.retain(|_, entry| match entry.banned_until {
            Some(until) => now < until,
            None => now.duration_since(entry.window_start) < window,
        });

        let purged = before - entries.len();
        if purged > 0 {
            info!("Purged {} expired sign-in throttle entries", purged);
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window_seconds: 60,
            ban_duration_seconds: 120,
        })
    }

    #[tokio::test]
    async fn test_locks_out_after_max_attempts() {
        let limiter = limiter(3);
        let now = Instant::now();

        assert!(limiter.try_attempt_at("alice", now).await);
        assert!(limiter.try_attempt_at("alice", now).await);
        assert!(limiter.try_attempt_at("alice", now).await);
        assert!(!limiter.try_attempt_at("alice", now).await);

        // other keys are unaffected
        assert!(limiter.try_attempt_at("bob", now).await);
    }

    #[tokio::test]
    async fn test_lockout_expires() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(limiter.try_attempt_at("alice", now).await);
        assert!(!limiter.try_attempt_at("alice", now + Duration::from_secs(119)).await);
        assert!(limiter.try_attempt_at("alice", now + Duration::from_secs(120)).await);
    }

    #[tokio::test]
    async fn test_window_restarts_count() {
        let limiter = limiter(2);
        let now = Instant::now();

        assert!(limiter.try_attempt_at("alice", now).await);
        let later = now + Duration::from_secs(61);
        assert!(limiter.try_attempt_at("alice", later).await);
        assert!(limiter.try_attempt_at("alice", later).await);
        assert!(!limiter.try_attempt_at("alice", later).await);
    }

    #[tokio::test]
    async fn test_reset_clears_attempts() {
        let limiter = limiter(2);

        assert!(limiter.try_attempt("alice").await);
        limiter.reset("alice").await;
        assert!(limiter.try_attempt("alice").await);
        assert!(limiter.try_attempt("alice").await);
        assert!(!limiter.try_attempt("alice").await);
    }

    #[tokio::test]
    async fn test_concurrent_attempts_never_exceed_limit() {
        let limiter = limiter(5);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.try_attempt("alice").await })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }

    #[tokio::test]
    async fn test_purge_drops_stale_keys_only() {
        let limiter = limiter(2);
        let now = Instant::now();

        for i in 0..1000 {
            limiter.try_attempt_at(&format!("user{i}"), now).await;
        }
        // banned until now + 120
        limiter.try_attempt_at("mallory", now).await;
        limiter.try_attempt_at("mallory", now).await;
        // fresh window
        limiter.try_attempt_at("carol", now + Duration::from_secs(100)).await;

        assert_eq!(limiter.purge_expired_at(now + Duration::from_secs(30)).await, 0);
        assert_eq!(limiter.purge_expired_at(now + Duration::from_secs(61)).await, 1000);
        assert!(!limiter.try_attempt_at("mallory", now + Duration::from_secs(61)).await);

        assert_eq!(limiter.purge_expired_at(now + Duration::from_secs(200)).await, 2);
        assert!(limiter.entries.lock().await.is_empty());
    }
}

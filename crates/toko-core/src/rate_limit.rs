//! Fixed-window login attempt limiting.
//!
//! Each client key (usually the source IP) gets a window that opens on its
//! first attempt. Up to `max_attempts` attempts are allowed inside the
//! window; later ones are denied until the window has fully elapsed, at
//! which point the next attempt opens a fresh window.
//!
//! Expired windows are replaced lazily on the next attempt. A sweeper task
//! ([`LoginRateLimiter::spawn_sweeper`]) can additionally purge them so
//! clients that never come back do not accumulate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Attempts allowed per window.
    pub max_attempts: u32,
    /// Window length, measured from the first attempt.
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }
}

impl Default for RateLimitConfig {
    /// 5 attempts per 30 minutes.
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW)
    }
}

/// Outcome of recording one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow,
    /// The ceiling is exceeded; the window ends after `retry_after`.
    Deny { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allow)
    }
}

/// Attempt counter for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    pub attempt_count: u32,
    pub window_start: Instant,
}

impl RateLimitWindow {
    fn open(now: Instant) -> Self {
        Self {
            attempt_count: 1,
            window_start: now,
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    fn remaining(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.saturating_duration_since(self.window_start))
    }
}

/// Shared per-client attempt counters.
///
/// Cloning is cheap and all clones share the same counters. Every
/// check-and-record runs under a single lock, so concurrent attempts from
/// one client are all counted.
#[derive(Debug, Clone)]
pub struct LoginRateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<String, RateLimitWindow>>>,
}

impl LoginRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Record one attempt for `key` at `now` and decide whether it may
    /// proceed.
    pub async fn check_and_record(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut windows = self.windows.lock().await;

        match windows.get_mut(key) {
            Some(window) if !window.is_expired(now, self.config.window) => {
                window.attempt_count = window.attempt_count.saturating_add(1);
                if window.attempt_count > self.config.max_attempts {
                    let retry_after = window.remaining(now, self.config.window);
                    tracing::debug!(
                        client = %key,
                        attempts = window.attempt_count,
                        retry_after_secs = retry_after.as_secs(),
                        "Login attempt denied"
                    );
                    RateLimitDecision::Deny { retry_after }
                } else {
                    RateLimitDecision::Allow
                }
            }
            _ => {
                windows.insert(key.to_string(), RateLimitWindow::open(now));
                RateLimitDecision::Allow
            }
        }
    }

    /// Take back one recorded attempt of `key`, used for attempts that
    /// succeeded. The window itself stays open, so failures already
    /// counted in it still count.
    pub async fn refund(&self, key: &str) {
        if let Some(window) = self.windows.lock().await.get_mut(key) {
            window.attempt_count = window.attempt_count.saturating_sub(1);
        }
    }

    /// Current window of `key`, if one is open.
    pub async fn window(&self, key: &str) -> Option<RateLimitWindow> {
        self.windows.lock().await.get(key).copied()
    }

    /// Drop every window that has expired at `now`. Returns how many
    /// were removed.
    pub async fn purge_expired(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| !window.is_expired(now, self.config.window));
        before - windows.len()
    }

    /// Number of tracked clients.
    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }

    /// Periodically purge expired windows until `cancel` fires.
    pub fn spawn_sweeper(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let purged = limiter.purge_expired(Instant::now()).await;
                        if purged > 0 {
                            tracing::debug!(purged, "Purged expired login windows");
                        }
                    }
                }
            }
            tracing::debug!("Login rate limit sweeper stopped");
        })
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

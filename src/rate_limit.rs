use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

use crate::metrics::RATE_WINDOWS;

// Which endpoint a request counts against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointCategory {
    Token,
    Sol,
}

impl EndpointCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointCategory::Token => "token",
            EndpointCategory::Sol => "sol",
        }
    }
}

impl fmt::Display for EndpointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window }
    }
}

// Rate limit entry - tracks requests per (client, category)
pub struct RateWindow {
    pub count: u32,
    pub window_start: Instant,
}

impl RateWindow {
    fn expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    // time until the current window closes
    pub retry_after: Duration,
}

// Fixed-window limiter keyed by client address and endpoint category.
//
// Each key is updated while holding its DashMap shard lock, so concurrent
// requests from one client never lose an increment.
pub struct RateLimiter {
    windows: DashMap<(String, EndpointCategory), RateWindow>,
    token: RateLimitConfig,
    sol: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(token: RateLimitConfig, sol: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            token,
            sol,
        }
    }

    pub fn config(&self, category: EndpointCategory) -> RateLimitConfig {
        match category {
            EndpointCategory::Token => self.token,
            EndpointCategory::Sol => self.sol,
        }
    }

    pub fn check(&self, client: &str, category: EndpointCategory) -> RateDecision {
        self.check_at(client, category, Instant::now())
    }

    pub fn check_at(&self, client: &str, category: EndpointCategory, now: Instant) -> RateDecision {
        let config = self.config(category);

        let mut entry = self
            .windows
            .entry((client.to_string(), category))
            .or_insert(RateWindow {
                count: 0,
                window_start: now,
            });

        // window expired (or fresh)? start over
        if entry.count == 0 || entry.expired(now, config.window) {
            entry.count = 1;
            entry.window_start = now;
            return RateDecision {
                allowed: true,
                remaining: config.max_requests.saturating_sub(1),
                retry_after: config.window,
            };
        }

        // a window too long for the clock never closes
        let retry_after = entry
            .window_start
            .checked_add(config.window)
            .map_or(config.window, |end| end.saturating_duration_since(now));

        if entry.count < config.max_requests {
            entry.count += 1;
            return RateDecision {
                allowed: true,
                remaining: config.max_requests - entry.count,
                retry_after,
            };
        }

        RateDecision {
            allowed: false,
            remaining: 0,
            retry_after,
        }
    }

    // Drops every window that has already closed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|(_, category), window| !window.expired(now, self.config(*category).window));
        let after = self.windows.len();
        RATE_WINDOWS.set(after as f64);
        before.saturating_sub(after)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }
}

// Background sweep of expired windows
pub async fn window_sweeper(limiter: Arc<RateLimiter>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    tracing::info!(interval = ?sweep_interval, "rate window sweeper started");

    loop {
        interval.tick().await;
        let removed = limiter.purge_expired(Instant::now());
        if removed > 0 {
            tracing::debug!(removed, live = limiter.len(), "evicted expired rate windows");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(token_max: u32, sol_max: u32) -> RateLimiter {
        RateLimiter::new(
            RateLimitConfig::new(token_max, Duration::from_secs(60)),
            RateLimitConfig::new(sol_max, Duration::from_secs(60)),
        )
    }

    #[test]
    fn denies_the_request_after_the_limit() {
        let limiter = limiter(1, 5);
        let t0 = Instant::now();

        for i in 0..5 {
            let decision = limiter.check_at("10.0.0.1", EndpointCategory::Sol, t0 + Duration::from_secs(i));
            assert!(decision.allowed, "request {} should pass", i + 1);
            assert_eq!(decision.remaining, 4 - i as u32);
        }

        let sixth = limiter.check_at("10.0.0.1", EndpointCategory::Sol, t0 + Duration::from_secs(10));
        assert!(!sixth.allowed);
        assert_eq!(sixth.retry_after, Duration::from_secs(50));
    }

    #[test]
    fn denial_does_not_extend_the_count() {
        let limiter = limiter(2, 5);
        let t0 = Instant::now();
        for _ in 0..10 {
            limiter.check_at("a", EndpointCategory::Token, t0);
        }
        let entry = limiter.windows.get(&("a".to_string(), EndpointCategory::Token)).unwrap();
        assert_eq!(entry.count, 2);
    }

    #[test]
    fn new_window_after_expiry() {
        let limiter = limiter(1, 5);
        let t0 = Instant::now();

        assert!(limiter.check_at("a", EndpointCategory::Token, t0).allowed);
        assert!(!limiter.check_at("a", EndpointCategory::Token, t0 + Duration::from_secs(59)).allowed);
        assert!(limiter.check_at("a", EndpointCategory::Token, t0 + Duration::from_secs(60)).allowed);
        assert!(!limiter.check_at("a", EndpointCategory::Token, t0 + Duration::from_secs(61)).allowed);
    }

    #[test]
    fn oversized_window_does_not_overflow() {
        let limiter = RateLimiter::new(
            RateLimitConfig::new(1, Duration::from_secs(u64::MAX)),
            RateLimitConfig::new(1, Duration::from_secs(60)),
        );
        let t0 = Instant::now();

        assert!(limiter.check_at("a", EndpointCategory::Token, t0).allowed);
        let second = limiter.check_at("a", EndpointCategory::Token, t0);
        assert!(!second.allowed);
        assert_eq!(second.retry_after, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn categories_and_clients_are_independent() {
        let limiter = limiter(1, 5);
        let t0 = Instant::now();

        assert!(limiter.check_at("a", EndpointCategory::Token, t0).allowed);
        assert!(!limiter.check_at("a", EndpointCategory::Token, t0).allowed);
        assert!(limiter.check_at("a", EndpointCategory::Sol, t0).allowed);
        assert!(limiter.check_at("b", EndpointCategory::Token, t0).allowed);
    }

    #[test]
    fn purge_drops_only_closed_windows() {
        let limiter = limiter(1, 5);
        let t0 = Instant::now();
        limiter.check_at("old", EndpointCategory::Sol, t0);
        limiter.check_at("new", EndpointCategory::Sol, t0 + Duration::from_secs(30));

        let removed = limiter.purge_expired(t0 + Duration::from_secs(61));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn concurrent_requests_never_exceed_max() {
        let limiter = Arc::new(limiter(1, 50));
        let t0 = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..25)
                        .filter(|_| limiter.check_at("shared", EndpointCategory::Sol, t0).allowed)
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }
}

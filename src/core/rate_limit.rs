use log::{debug, trace};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Sliding-window limiter: at most `calls` permits within any trailing
/// `period`.
///
/// The window lock is held while waiting, so concurrent callers queue up
/// behind it and are granted one at a time in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    calls: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
    granted: AtomicU64,
}

impl RateLimiter {
    /// `calls == 0` or a zero `period` grants every request immediately.
    pub fn new(calls: usize, period: Duration) -> Self {
        Self {
            calls,
            period,
            window: Mutex::new(VecDeque::with_capacity(calls)),
            granted: AtomicU64::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn is_unlimited(&self) -> bool {
        self.calls == 0 || self.period.is_zero()
    }

    /// Waits until a permit is available and returns the instant it was
    /// granted. Never fails.
    pub async fn acquire(&self) -> Instant {
        if self.is_unlimited() {
            self.granted.fetch_add(1, Ordering::SeqCst);
            return Instant::now();
        }

        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            while window
                .front()
                .is_some_and(|granted| now.duration_since(*granted) >= self.period)
            {
                window.pop_front();
            }

            if window.len() < self.calls {
                window.push_back(now);
                let total = self.granted.fetch_add(1, Ordering::SeqCst) + 1;
                trace!("Permit {} granted ({}/{} in window)", total, window.len(), self.calls);
                return now;
            }

            if let Some(oldest) = window.front() {
                let wait = self.period.saturating_sub(now.duration_since(*oldest));
                debug!("Rate limit reached, waiting {:?}", wait);
                sleep(wait).await;
            }
        }
    }

    /// Total permits handed out since construction.
    pub fn granted_permits(&self) -> u64 {
        self.granted.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_one_per_second_spacing() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));
        let mut grants = Vec::new();
        for _ in 0..3 {
            grants.push(limiter.acquire().await);
        }

        for pair in grants.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            assert!(gap >= Duration::from_millis(990), "gap was {:?}", gap);
            assert!(gap < Duration::from_millis(1500), "gap was {:?}", gap);
        }
        assert_eq!(limiter.granted_permits(), 3);
    }

    #[tokio::test]
    async fn test_burst_up_to_calls() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));
        let first = limiter.acquire().await;
        tokio::time::advance(Duration::from_millis(600)).await;
        limiter.acquire().await;

        // Third permit only has to wait for the first to leave the window.
        let third = limiter.acquire().await;
        let waited = third.duration_since(first);
        assert!(waited >= Duration::from_secs(1));
        assert!(waited < Duration::from_millis(1100));
    }

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        for limiter in [
            RateLimiter::new(0, Duration::from_secs(5)),
            RateLimiter::new(5, Duration::ZERO),
            RateLimiter::unlimited(),
        ] {
            let start = Instant::now();
            for _ in 0..50 {
                limiter.acquire().await;
            }
            assert!(start.elapsed() < Duration::from_millis(100));
            assert_eq!(limiter.granted_permits(), 50);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquires_do_not_over_grant() {
        let limiter = Arc::new(RateLimiter::new(2, Duration::from_secs(1)));
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();

        let mut grants = Vec::new();
        for handle in handles {
            grants.push(handle.await.unwrap());
        }
        grants.sort();

        // Any three consecutive grants must span at least one period.
        for triple in grants.windows(3) {
            assert!(triple[2].duration_since(triple[0]) >= Duration::from_secs(1));
        }
        assert_eq!(limiter.granted_permits(), 6);
    }
}

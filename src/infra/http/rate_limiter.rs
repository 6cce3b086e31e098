use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Sliding-window limiter: at most `max_per_window` permits start within any
/// `window`-long span of time.
///
/// Callers queue on an async mutex (FIFO), so a burst is spread out instead of
/// rejected. The deque holds the start times of the most recent permits.
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    recent: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        let max_per_window = max_per_window.max(1) as usize;
        Self {
            max_per_window,
            window,
            recent: Mutex::new(VecDeque::with_capacity(max_per_window)),
        }
    }

    pub fn per_second(max: u32) -> Self {
        Self::new(max, Duration::from_secs(1))
    }

    /// Wait until another request may start, then record it.
    pub async fn acquire(&self) {
        let mut recent = self.recent.lock().await;

        let now = Instant::now();
        while recent.front().is_some_and(|t| *t + self.window <= now) {
            recent.pop_front();
        }

        if recent.len() >= self.max_per_window {
            if let Some(oldest) = recent.pop_front() {
                // Hold the lock while sleeping so later callers stay behind us.
                sleep_until(oldest + self.window).await;
            }
        }

        recent.push_back(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_never_more_than_the_ceiling_in_any_window() {
        let limiter = Arc::new(RateLimiter::per_second(30));
        let mut handles = Vec::new();

        for _ in 0..100 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut started = Vec::new();
        for handle in handles {
            started.push(handle.await.unwrap());
        }
        started.sort();

        assert_eq!(started.len(), 100);
        // The 31st request after any given one must start a full second later.
        for pair in started.windows(31) {
            assert!(pair[30] - pair[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_under_the_ceiling_do_not_wait() {
        let limiter = RateLimiter::per_second(5);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await;
        }

        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_frees_up_after_it_passes() {
        let limiter = RateLimiter::new(2, Duration::from_millis(500));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert_eq!(Instant::now() - start, Duration::from_millis(500));
    }
}

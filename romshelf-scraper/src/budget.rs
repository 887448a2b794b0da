//! Shared rate budget for outbound ScreenScraper calls.
//!
//! One budget instance is shared by every worker; permits refill by window
//! expiry, never on release, so the aggregate call rate stays bounded no
//! matter how many workers are running.

use std::collections::VecDeque;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// A rolling-window request budget: at most `max_calls` acquires within any
/// window of `window` length.
///
/// `acquire` blocks until a slot is free. The budget is injected into the
/// gateway rather than living in a global so tests can substitute
/// [`RateBudget::unlimited`].
pub struct RateBudget {
    max_calls: usize,
    window: Duration,
    history: Mutex<VecDeque<Instant>>,
}

impl RateBudget {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// A budget that never blocks, for tests and offline paths.
    pub fn unlimited() -> Self {
        Self::new(usize::MAX, Duration::ZERO)
    }

    /// Block until a call slot is available, then consume it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let now = Instant::now();
                let mut history = self.history.lock().await;
                while let Some(&oldest) = history.front() {
                    if now.duration_since(oldest) >= self.window {
                        history.pop_front();
                    } else {
                        break;
                    }
                }
                if history.len() < self.max_calls {
                    history.push_back(now);
                    return;
                }
                // Full window: sleep until the oldest call ages out. Lock is
                // dropped before sleeping so other workers can race for the slot.
                self.window - now.duration_since(*history.front().unwrap())
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Calls currently counted against the window. Test hook.
    pub async fn in_window(&self) -> usize {
        let now = Instant::now();
        let mut history = self.history.lock().await;
        while let Some(&oldest) = history.front() {
            if now.duration_since(oldest) >= self.window {
                history.pop_front();
            } else {
                break;
            }
        }
        history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_acquires_within_budget_do_not_block() {
        let budget = RateBudget::new(3, Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..3 {
            budget.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(budget.in_window().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_blocks_until_window_expires() {
        let budget = RateBudget::new(2, Duration::from_secs(10));
        let start = Instant::now();
        budget.acquire().await;
        budget.acquire().await;
        // Third call must wait out the full window behind the first.
        budget.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert_eq!(budget.in_window().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rolling_window_never_exceeds_limit() {
        let budget = RateBudget::new(4, Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..12 {
            budget.acquire().await;
            assert!(budget.in_window().await <= 4);
        }
        // 12 calls at 4 per minute: the first 4 are free, the rest each wait
        // for an expiry, so at least two full windows elapse.
        assert!(start.elapsed() >= Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_across_concurrent_workers() {
        use std::sync::Arc;

        let budget = Arc::new(RateBudget::new(2, Duration::from_secs(5)));
        let start = Instant::now();
        let workers: Vec<_> = (0..6)
            .map(|_| {
                let budget = budget.clone();
                tokio::spawn(async move { budget.acquire().await })
            })
            .collect();
        for w in workers {
            w.await.unwrap();
        }
        // 6 calls at 2 per 5s needs two expiries: at least 10s total.
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_unlimited_never_blocks() {
        let budget = RateBudget::unlimited();
        for _ in 0..100 {
            budget.acquire().await;
        }
    }
}

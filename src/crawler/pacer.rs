//! Request pacing
//!
//! Two mechanisms gate every fetch: the per-host crawl delay from
//! robots.txt, and a global back-pressure sleep that grows quadratically
//! with the number of active workers so aggregate load stays roughly
//! flat as the subdomain fan-out widens.

use std::time::{Duration, Instant};

/// Per-worker fetch pacer
#[derive(Debug, Default)]
pub struct Pacer {
    last_fetch: Option<Instant>,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps until the host's crawl delay has elapsed since the last
    /// dispatch, applies the global back-pressure sleep, and records the
    /// new dispatch time.
    pub async fn pace(&mut self, delay_secs: u64, active_workers: usize, throttle_factor: f64) {
        if let Some(last) = self.last_fetch {
            let min_gap = Duration::from_secs(delay_secs);
            let elapsed = last.elapsed();
            if elapsed < min_gap {
                tokio::time::sleep(min_gap - elapsed).await;
            }
        }

        let throttle = throttle_secs(throttle_factor, active_workers);
        if throttle > 0 {
            tracing::trace!("back-pressure sleep: {}s ({} workers)", throttle, active_workers);
            tokio::time::sleep(Duration::from_secs(throttle)).await;
        }

        self.last_fetch = Some(Instant::now());
    }
}

/// Back-pressure sleep in whole seconds: `floor(factor × workers²)`
pub fn throttle_secs(factor: f64, workers: usize) -> u64 {
    (factor * (workers * workers) as f64).floor() as u64
}

/// Watchdog timeout for one fetch: `multiplier × delay`, with the delay
/// clamped to at least one second so a zero crawl-delay cannot produce
/// an instant cancellation
pub fn watchdog_timeout(delay_secs: u64, multiplier: u64) -> Duration {
    Duration::from_secs(multiplier * delay_secs.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_zero_for_small_fleets() {
        // 0.02 × W² stays below 1 through seven workers
        for w in 0..=7 {
            assert_eq!(throttle_secs(0.02, w), 0, "workers={}", w);
        }
    }

    #[test]
    fn test_throttle_grows_quadratically() {
        assert_eq!(throttle_secs(0.02, 8), 1);
        assert_eq!(throttle_secs(0.02, 10), 2);
        assert_eq!(throttle_secs(0.02, 20), 8);
        assert_eq!(throttle_secs(0.02, 50), 50);
    }

    #[test]
    fn test_throttle_factor_tunable() {
        assert_eq!(throttle_secs(0.0, 50), 0);
        assert_eq!(throttle_secs(1.0, 3), 9);
    }

    #[test]
    fn test_watchdog_timeout_scales_with_delay() {
        assert_eq!(watchdog_timeout(2, 10), Duration::from_secs(20));
        assert_eq!(watchdog_timeout(1, 10), Duration::from_secs(10));
    }

    #[test]
    fn test_watchdog_timeout_clamps_zero_delay() {
        assert_eq!(watchdog_timeout(0, 10), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_pace_first_fetch_is_immediate() {
        let mut pacer = Pacer::new();
        let before = Instant::now();
        pacer.pace(5, 1, 0.02).await;
        assert!(before.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_pace_enforces_delay_between_fetches() {
        let mut pacer = Pacer::new();
        pacer.pace(1, 1, 0.02).await;
        let before = Instant::now();
        pacer.pace(1, 1, 0.02).await;
        assert!(before.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_pace_zero_delay_does_not_sleep() {
        let mut pacer = Pacer::new();
        pacer.pace(0, 1, 0.02).await;
        let before = Instant::now();
        pacer.pace(0, 1, 0.02).await;
        assert!(before.elapsed() < Duration::from_millis(100));
    }
}

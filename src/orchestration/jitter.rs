//! Randomized dispatch delay.
//!
//! Spreads the start of N simultaneous device tasks across a window so their
//! first commands do not hit the shared radio link as one burst. Timing only:
//! outcomes never depend on the drawn delay.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterScheduler {
    window: Duration,
}

impl JitterScheduler {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Scheduler that always yields a zero delay
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Draw a delay uniformly from `[0, window)`.
    pub fn draw(&self) -> Duration {
        let window_nanos = u64::try_from(self.window.as_nanos()).unwrap_or(u64::MAX);
        if window_nanos == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::thread_rng().gen_range(0..window_nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_stay_inside_window() {
        let scheduler = JitterScheduler::new(Duration::from_millis(1_500));
        for _ in 0..1_000 {
            assert!(scheduler.draw() < Duration::from_millis(1_500));
        }
    }

    #[test]
    fn test_disabled_scheduler_is_zero() {
        let scheduler = JitterScheduler::disabled();
        assert_eq!(scheduler.draw(), Duration::ZERO);
        assert_eq!(scheduler.window(), Duration::ZERO);
    }

    #[test]
    fn test_draws_vary() {
        let scheduler = JitterScheduler::new(Duration::from_secs(10));
        let first = scheduler.draw();
        assert!((0..50).any(|_| scheduler.draw() != first));
    }
}

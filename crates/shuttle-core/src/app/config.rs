//! Loop configuration: name, pacing, iteration limit, queue capacity.

use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

/// Configuration for a `WorkerLoop`.
///
/// The default is an unnamed-ish ("worker"), unpaced, unlimited loop with an
/// unbounded queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Shows up in the tracing span and the report.
    pub name: String,

    /// Upper bound on iterations per second. `None` runs as fast as `step` allows.
    pub max_rate: Option<NonZeroU32>,

    /// The loop requests its own stop after this many `step` calls.
    pub max_iterations: Option<u64>,

    /// Bound on the handoff queue. `None` is unbounded.
    pub queue_capacity: Option<NonZeroUsize>,
}

impl LoopConfig {
    /// Rate used by [`LoopConfig::paced`].
    pub const FALLBACK_MAX_RATE: u32 = 60;

    /// Shortest pacing period. Rates above 1e9/s round down to this.
    pub const MIN_ITERATION_PERIOD: Duration = Duration::from_nanos(1);

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A loop capped at [`FALLBACK_MAX_RATE`](Self::FALLBACK_MAX_RATE) iterations per second.
    pub fn paced(name: impl Into<String>) -> Self {
        Self::new(name).with_max_rate(Self::FALLBACK_MAX_RATE)
    }

    /// `0` removes the cap.
    pub fn with_max_rate(mut self, per_second: u32) -> Self {
        self.max_rate = NonZeroU32::new(per_second);
        self
    }

    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// `0` means unbounded.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = NonZeroUsize::new(capacity);
        self
    }

    /// Minimum time between the starts of two iterations.
    ///
    /// Example: max_rate=50 -> 20ms, max_rate=60 -> 16.666ms
    ///
    /// Never zero: `tokio::time::interval` rejects a zero period.
    pub fn iteration_period(&self) -> Option<Duration> {
        self.max_rate.map(|rate| {
            (Duration::from_secs(1) / rate.get()).max(Self::MIN_ITERATION_PERIOD)
        })
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            name: "worker".to_string(),
            max_rate: None,
            max_iterations: None,
            queue_capacity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_is_unpaced_and_unbounded() {
        let config = LoopConfig::default();
        assert_eq!(config.name, "worker");
        assert_eq!(config.iteration_period(), None);
        assert_eq!(config.max_iterations, None);
        assert_eq!(config.queue_capacity, None);
    }

    #[rstest]
    #[case::fifty(50, Some(Duration::from_millis(20)))]
    #[case::thousand(1000, Some(Duration::from_millis(1)))]
    #[case::one_per_nanosecond(1_000_000_000, Some(Duration::from_nanos(1)))]
    #[case::above_nanosecond_resolution(2_000_000_000, Some(Duration::from_nanos(1)))]
    #[case::max(u32::MAX, Some(Duration::from_nanos(1)))]
    #[case::uncapped(0, None)]
    fn iteration_period_follows_rate(#[case] rate: u32, #[case] expected: Option<Duration>) {
        let config = LoopConfig::new("t").with_max_rate(rate);
        assert_eq!(config.iteration_period(), expected);
    }

    #[test]
    fn paced_uses_fallback_rate() {
        let config = LoopConfig::paced("sensor");
        assert_eq!(config.max_rate.map(NonZeroU32::get), Some(60));
    }

    #[test]
    fn zero_capacity_means_unbounded() {
        assert_eq!(LoopConfig::default().with_queue_capacity(0).queue_capacity, None);
        assert_eq!(
            LoopConfig::default()
                .with_queue_capacity(8)
                .queue_capacity
                .map(NonZeroUsize::get),
            Some(8)
        );
    }
}

//! Smoothed round-trip and clock-offset estimation
//!
//! One estimator lives per connection: created at connect, fed by every
//! probe round-trip, discarded at disconnect.

/// IIR low-pass over one-way latency samples (75% retention of the prior
/// estimate, alpha = 0.25)
#[derive(Debug, Clone, Copy, Default)]
pub struct PingEstimator {
    smoothed_ms: Option<f32>,
}

impl PingEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-way latency sample from a probe echo: half the round trip
    pub fn sample_from_echo(now_ms: u64, echoed_start_ms: u64) -> f32 {
        now_ms.saturating_sub(echoed_start_ms) as f32 / 2.0
    }

    /// Fold a sample into the smoothed estimate and return it
    ///
    /// The first sample has no prior and initializes the filter with itself.
    pub fn record(&mut self, sample_ms: f32) -> f32 {
        let smoothed = match self.smoothed_ms {
            Some(prev) => (sample_ms + 3.0 * prev) / 4.0,
            None => sample_ms,
        };
        self.smoothed_ms = Some(smoothed);
        smoothed
    }

    /// Adopt a smoothed value computed elsewhere (the server-reported
    /// average carried by a ping probe)
    pub fn adopt(&mut self, smoothed_ms: f32) {
        self.smoothed_ms = Some(smoothed_ms);
    }

    /// Current smoothed one-way latency, 0 before the first sample
    pub fn smoothed_ms(&self) -> f32 {
        self.smoothed_ms.unwrap_or(0.0)
    }

    /// Estimated offset from the local clock to the server clock, in millis
    ///
    /// A probe stamped `server_start_ms` arrives one smoothed latency later;
    /// the difference to the local receive time is the clock offset the
    /// jitter buffer drains against. May be negative.
    pub fn clock_offset(&self, server_start_ms: u64, local_now_ms: u64) -> i64 {
        server_start_ms as i64 + self.smoothed_ms().round() as i64 - local_now_ms as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_initializes_the_filter() {
        let mut ping = PingEstimator::new();
        assert_eq!(ping.record(80.0), 80.0);
    }

    #[test]
    fn constant_samples_are_a_fixed_point() {
        // (x + 3x)/4 == x, so the filter must hold steady at 100
        let mut ping = PingEstimator::new();
        for _ in 0..20 {
            ping.record(100.0);
        }
        assert!((ping.smoothed_ms() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn converges_toward_a_step_change() {
        let mut ping = PingEstimator::new();
        ping.record(100.0);
        for _ in 0..40 {
            ping.record(20.0);
        }
        assert!((ping.smoothed_ms() - 20.0).abs() < 0.1);
    }

    #[test]
    fn single_outlier_moves_estimate_by_a_quarter() {
        let mut ping = PingEstimator::new();
        ping.record(100.0);
        assert!((ping.record(200.0) - 125.0).abs() < 1e-3);
    }

    #[test]
    fn echo_sample_is_half_the_round_trip() {
        assert_eq!(PingEstimator::sample_from_echo(1300, 1100), 100.0);
        // A clock hiccup can't produce a negative sample
        assert_eq!(PingEstimator::sample_from_echo(1000, 1100), 0.0);
    }

    #[test]
    fn clock_offset_accounts_for_latency() {
        let mut ping = PingEstimator::new();
        ping.adopt(40.0);
        // Server stamped 5000, we received at local 4900: server is ahead
        assert_eq!(ping.clock_offset(5000, 4900), 140);
        // Local clock ahead of the server clock yields a negative offset
        assert_eq!(ping.clock_offset(5000, 5200), -160);
    }
}

//! Loop frequency measurement.

use std::time::{Duration, Instant};

/// Counts completed cycles and yields the achieved rate once per report
/// interval.
#[derive(Debug, Clone)]
pub struct RateMeter {
    interval: Duration,
    window_start: Instant,
    cycles: u64,
    total: u64,
}

impl RateMeter {
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    fn starting_at(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            window_start: now,
            cycles: 0,
            total: 0,
        }
    }

    /// Record one cycle; returns the rate in Hz when a report is due
    pub fn record(&mut self) -> Option<f64> {
        self.record_at(Instant::now())
    }

    fn record_at(&mut self, now: Instant) -> Option<f64> {
        self.cycles += 1;
        self.total += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let hz = self.cycles as f64 / elapsed.as_secs_f64();
        self.window_start = now;
        self.cycles = 0;
        Some(hz)
    }

    /// Restart the measurement window, e.g. after a pause
    pub fn restart(&mut self) {
        self.window_start = Instant::now();
        self.cycles = 0;
    }

    /// Cycles recorded since creation
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_report_before_interval() {
        let start = Instant::now();
        let mut meter = RateMeter::starting_at(Duration::from_millis(500), start);
        for i in 1..100 {
            assert!(meter.record_at(start + Duration::from_millis(i)).is_none());
        }
    }

    #[test]
    fn test_reports_rate_and_restarts_window() {
        let start = Instant::now();
        let mut meter = RateMeter::starting_at(Duration::from_millis(500), start);

        for i in 1..500 {
            meter.record_at(start + Duration::from_millis(i));
        }
        let hz = meter.record_at(start + Duration::from_millis(500)).unwrap();
        assert!((hz - 1000.0).abs() < 1e-6);

        assert!(meter.record_at(start + Duration::from_millis(501)).is_none());
        assert_eq!(meter.total(), 501);
    }
}

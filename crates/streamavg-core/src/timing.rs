//! Elapsed-time accumulators for host and device updates.

use std::time::{Duration, Instant};

/// Running totals of host and device update time. Never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingAccumulators {
    host: Duration,
    device: Duration,
}

impl TimingAccumulators {
    /// Create zeroed accumulators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, adding its wall time to the host total.
    pub fn time_host<R>(&mut self, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.host += start.elapsed();
        result
    }

    /// Run `f`, adding its wall time to the device total.
    pub fn time_device<R>(&mut self, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.device += start.elapsed();
        result
    }

    /// Total host time in milliseconds.
    pub fn host_ms(&self) -> f64 {
        self.host.as_secs_f64() * 1000.0
    }

    /// Total device time in milliseconds.
    pub fn device_ms(&self) -> f64 {
        self.device.as_secs_f64() * 1000.0
    }

    /// `(1 - device / host) * 100`, or `0` before any host time is recorded.
    pub fn runtime_reduction_pct(&self) -> f64 {
        runtime_reduction_pct(self.host_ms(), self.device_ms())
    }
}

/// Percentage runtime reduction of `device_ms` relative to `host_ms`.
pub fn runtime_reduction_pct(host_ms: f64, device_ms: f64) -> f64 {
    if host_ms <= 0.0 {
        0.0
    } else {
        (1.0 - device_ms / host_ms) * 100.0
    }
}

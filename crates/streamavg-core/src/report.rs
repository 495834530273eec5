//! Consistency and timing report.
//!
//! Compares the host reference with a device readback using L2 norms and
//! summarizes the accumulated update times.

use std::fmt;

use crate::timing::runtime_reduction_pct;

/// L2 norms comparing a candidate vector against a reference vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorNorms {
    /// `||reference||_2`.
    pub reference_norm: f64,
    /// `||reference - candidate||_2`.
    pub difference_norm: f64,
}

impl ErrorNorms {
    /// Compute the norms in `f64`. Both slices must have equal length.
    pub fn compute(reference: &[f32], candidate: &[f32]) -> Self {
        debug_assert_eq!(reference.len(), candidate.len());

        let mut reference_sq = 0.0f64;
        let mut difference_sq = 0.0f64;
        for (r, c) in reference.iter().zip(candidate) {
            let r = *r as f64;
            let d = r - *c as f64;
            reference_sq += r * r;
            difference_sq += d * d;
        }

        Self {
            reference_norm: reference_sq.sqrt(),
            difference_norm: difference_sq.sqrt(),
        }
    }

    /// Relative error as a ratio.
    ///
    /// With a zero reference norm this is `0` for identical vectors and
    /// `+inf` otherwise.
    pub fn relative(&self) -> f64 {
        if self.reference_norm == 0.0 {
            if self.difference_norm == 0.0 {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            self.difference_norm / self.reference_norm
        }
    }

    /// Relative error as a percentage.
    pub fn relative_pct(&self) -> f64 {
        self.relative() * 100.0
    }
}

/// Snapshot produced by the reporter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    /// Vector capacity.
    pub size: usize,
    /// Number of updates applied.
    pub updates: u32,
    /// Total host update time in milliseconds.
    pub host_ms: f64,
    /// Total device dispatch time in milliseconds.
    pub device_ms: f64,
    /// Host vs device norms.
    pub norms: ErrorNorms,
    /// Leading host elements for spot inspection.
    pub host_head: Vec<f32>,
    /// Leading device elements for spot inspection.
    pub device_head: Vec<f32>,
}

impl ConsistencyReport {
    /// Build a report from full host and device vectors.
    pub fn new(
        host: &[f32],
        device: &[f32],
        updates: u32,
        host_ms: f64,
        device_ms: f64,
        head: usize,
    ) -> Self {
        let head = head.min(host.len()).min(device.len());
        Self {
            size: host.len(),
            updates,
            host_ms,
            device_ms,
            norms: ErrorNorms::compute(host, device),
            host_head: host[..head].to_vec(),
            device_head: device[..head].to_vec(),
        }
    }

    /// Percentage runtime reduction of the device over the host.
    pub fn runtime_reduction_pct(&self) -> f64 {
        runtime_reduction_pct(self.host_ms, self.device_ms)
    }

    /// Device relative error to the host, in percent.
    pub fn relative_error_pct(&self) -> f64 {
        self.norms.relative_pct()
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results:")?;
        writeln!(
            f,
            "{} elements were updated {} time(s) to maintain input averages.",
            self.size, self.updates
        )?;
        writeln!(f)?;
        writeln!(f, "Host: {:.6} ms", self.host_ms)?;
        writeln!(f, "Device: {:.6} ms", self.device_ms)?;
        writeln!(f, "Runtime reduction: {:.6}%", self.runtime_reduction_pct())?;
        writeln!(f)?;
        write!(
            f,
            "Device relative error to host: {:.6}%",
            self.relative_error_pct()
        )?;
        for (i, (h, d)) in self.host_head.iter().zip(&self.device_head).enumerate() {
            write!(f, "\n\nhost[{}]: {:.6}\ndevice[{}]: {:.6}", i, h, i, d)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_have_zero_error() {
        let v = [1.0f32, -2.0, 3.0];
        let norms = ErrorNorms::compute(&v, &v);
        assert_eq!(norms.difference_norm, 0.0);
        assert!((norms.reference_norm - 14.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(norms.relative_pct(), 0.0);
    }

    #[test]
    fn test_relative_error() {
        let norms = ErrorNorms::compute(&[3.0, 4.0], &[3.0, 3.5]);
        assert!((norms.reference_norm - 5.0).abs() < 1e-12);
        assert!((norms.difference_norm - 0.5).abs() < 1e-12);
        assert!((norms.relative_pct() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_reference() {
        assert_eq!(ErrorNorms::compute(&[0.0; 3], &[0.0; 3]).relative(), 0.0);
        assert!(ErrorNorms::compute(&[0.0; 2], &[0.0, 1.0])
            .relative()
            .is_infinite());
    }

    #[test]
    fn test_report_text() {
        let host = [0.25f32; 4];
        let report = ConsistencyReport::new(&host, &host, 4, 2.0, 1.0, 2);
        let text = report.to_string();
        assert!(text.starts_with("Results:\n4 elements were updated 4 time(s)"));
        assert!(text.contains("Runtime reduction: 50.000000%"));
        assert!(text.contains("host[1]: 0.250000"));
        assert!(!text.contains("host[2]"));
        assert_eq!(report.host_head.len(), 2);
    }
}

//! Host reference engine.
//!
//! Applies the same incremental-mean formula as the device kernel,
//! sequentially over a plain host array.

use crate::error::{Result, StreamAvgError};
use crate::kernels::running_average;

/// Host mirror of the device weight vector.
#[derive(Debug, Clone, PartialEq)]
pub struct HostReference {
    weights: Vec<f32>,
}

impl HostReference {
    /// Allocate a zero-filled mirror of `size` elements.
    pub fn zeros(size: usize) -> Self {
        Self {
            weights: vec![0.0; size],
        }
    }

    /// Apply one update with iteration count `t`.
    pub fn apply(&mut self, sample: &[f32], t: u32) -> Result<()> {
        if sample.len() != self.weights.len() {
            return Err(StreamAvgError::InvalidSample {
                expected: self.weights.len(),
                actual: sample.len(),
            });
        }
        if t == 0 {
            return Err(StreamAvgError::IterationMismatch {
                expected: 1,
                actual: 0,
            });
        }

        for (w, x) in self.weights.iter_mut().zip(sample) {
            *w = running_average(*w, *x, t);
        }
        Ok(())
    }

    /// Current weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let host = HostReference::zeros(16);
        assert!(host.weights().iter().all(|w| *w == 0.0));
    }

    #[test]
    fn test_unit_vectors_average_to_quarter() {
        let mut host = HostReference::zeros(4);
        for t in 1..=4u32 {
            let mut x = [0.0f32; 4];
            x[(t - 1) as usize] = 1.0;
            host.apply(&x, t).unwrap();
        }
        for w in host.weights() {
            assert!((w - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rejects_wrong_length_without_mutation() {
        let mut host = HostReference::zeros(3);
        host.apply(&[1.0, 2.0, 3.0], 1).unwrap();
        let before = host.clone();
        assert!(host.apply(&[1.0, 2.0], 2).is_err());
        assert!(host.apply(&[1.0, 2.0, 3.0], 0).is_err());
        assert_eq!(host, before);
    }
}

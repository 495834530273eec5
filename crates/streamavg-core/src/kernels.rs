//! Kernel names, argument layout and the bundled OpenCL C program.

/// Name of the kernel that zero-fills the weight buffer.
pub const FILL_ZERO_KERNEL: &str = "fillZero";

/// Name of the running-average update kernel.
pub const UPDATE_KERNEL: &str = "UpdateWeights";

/// Argument index of the weight buffer in both kernels.
pub const ARG_WEIGHTS: u32 = 0;
/// Argument index of the input buffer in the update kernel.
pub const ARG_INPUT: u32 = 1;
/// Argument index of the iteration count in the update kernel.
pub const ARG_ITERATION: u32 = 2;

/// Default kernel program.
///
/// `fillZero(w)` writes `0` to every element; `UpdateWeights(w, x, t)` applies
/// one incremental-mean step. Both run one work-item per element in a
/// one-dimensional range.
pub const RUNNING_AVERAGE_CL: &str = r#"
__kernel void fillZero(__global float* w)
{
    const size_t i = get_global_id(0);
    w[i] = 0.0f;
}

__kernel void UpdateWeights(__global float* w,
                            __global const float* x,
                            const uint t)
{
    const size_t i = get_global_id(0);
    const float wi = w[i];
    w[i] = wi + (x[i] - wi) / (float)t;
}
"#;

/// One incremental-mean step: `w + (x - w) / t`.
///
/// Shared by the host reference and the simulated device so both apply the
/// same `f32` arithmetic.
#[inline]
pub fn running_average(w: f32, x: f32, t: u32) -> f32 {
    w + (x - w) / t as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_returns_sample() {
        assert_eq!(running_average(0.0, 0.75, 1), 0.75);
        assert_eq!(running_average(123.0, -2.5, 1), -2.5);
    }

    #[test]
    fn test_mean_of_sequence() {
        let samples = [2.0f32, 4.0, 6.0, 8.0];
        let mut w = 0.0;
        for (i, x) in samples.iter().enumerate() {
            w = running_average(w, *x, i as u32 + 1);
        }
        assert!((w - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_bundled_source_declares_both_kernels() {
        assert!(RUNNING_AVERAGE_CL.contains("__kernel void fillZero"));
        assert!(RUNNING_AVERAGE_CL.contains("__kernel void UpdateWeights"));
    }
}

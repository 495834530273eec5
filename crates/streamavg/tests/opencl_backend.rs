//! OpenCL backend integration tests.
//!
//! These tests require an OpenCL GPU. Tests skip themselves at runtime when
//! no device is found.
//!
//! Run with: cargo test --features opencl -p streamavg --test opencl_backend

#![cfg(feature = "opencl")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use streamavg::is_opencl_available;
use streamavg::prelude::*;

/// Helper macro to skip tests when no OpenCL GPU is available.
macro_rules! skip_without_opencl {
    () => {
        if !is_opencl_available() {
            eprintln!("Skipping test: OpenCL GPU not available");
            return;
        }
    };
}

fn engine(size: usize) -> RunningAverageEngine<OpenClBackend> {
    let backend = OpenClBackend::probe().expect("Failed to probe OpenCL device");
    let config = EngineConfig::builder().capacity_limit(size).build();
    RunningAverageEngine::initialize(backend, RUNNING_AVERAGE_CL, &config)
        .expect("Failed to initialize engine")
}

#[test]
fn test_opencl_availability_detection() {
    let available = is_opencl_available();
    println!("OpenCL available: {}", available);

    if !available {
        assert!(OpenClBackend::probe().is_err());
    }
}

#[test]
fn test_capabilities() {
    skip_without_opencl!();

    let backend = OpenClBackend::probe().unwrap();
    let caps = backend.capabilities();
    println!("{}", caps);

    assert!(!caps.name.is_empty());
    assert!(caps.compute_units > 0);
    assert!(caps.max_alloc_bytes > 0);
    assert!(caps.max_alloc_bytes <= caps.global_mem_bytes);
}

#[test]
fn test_zero_fill_and_first_update() {
    skip_without_opencl!();

    let mut engine = engine(1024);
    assert_eq!(engine.readback().unwrap(), vec![0.0; 1024]);

    let sample: Vec<f32> = (0..1024).map(|i| i as f32 * 0.5).collect();
    engine.update(&sample, 1).unwrap();
    assert_eq!(engine.readback().unwrap(), sample);
}

#[test]
fn test_device_matches_host() {
    skip_without_opencl!();

    let size = 4096;
    let mut engine = engine(size);
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..100 {
        let sample: Vec<f32> = (0..size).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
        engine.step(&sample).unwrap();
    }

    let first = engine.report().unwrap();
    let second = engine.report().unwrap();
    println!("{}", first);

    assert!(first.norms.relative() <= 1e-4);
    assert_eq!(first.norms, second.norms);
}

#[test]
fn test_compilation_failure() {
    skip_without_opencl!();

    let backend = OpenClBackend::probe().unwrap();
    let err = RunningAverageEngine::initialize(
        backend,
        "__kernel void fillZero(__global float* w) { w[0] = undeclared; }",
        &EngineConfig::default(),
    )
    .err()
    .unwrap();

    assert_eq!(err.kind(), ErrorKind::Compilation);
}

#[test]
fn test_missing_kernel_is_compilation_failure() {
    skip_without_opencl!();

    let backend = OpenClBackend::probe().unwrap();
    let err = RunningAverageEngine::initialize(
        backend,
        "__kernel void fillZero(__global float* w) { w[get_global_id(0)] = 0.0f; }",
        &EngineConfig::default(),
    )
    .err()
    .unwrap();

    assert_eq!(err.kind(), ErrorKind::Compilation);
    assert!(err.to_string().contains("UpdateWeights"));
}

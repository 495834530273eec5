//! Failure handling: every error leaves the engine in its previous state.

use streamavg::prelude::*;
use streamavg::Fault;

fn engine(size: usize) -> RunningAverageEngine<SimBackend> {
    let backend = SimBackend::new(SimProfile::Discrete).expect("Failed to create backend");
    let config = EngineConfig::builder().capacity_limit(size).build();
    RunningAverageEngine::initialize(backend, RUNNING_AVERAGE_CL, &config)
        .expect("Failed to initialize engine")
}

fn init_with_fault(fault: Fault) -> StreamAvgError {
    let mut backend = SimBackend::new(SimProfile::Discrete).unwrap();
    backend.inject_fault(fault);
    let config = EngineConfig::builder().capacity_limit(8).build();
    RunningAverageEngine::initialize(backend, RUNNING_AVERAGE_CL, &config)
        .err()
        .expect("initialization should fail")
}

#[test]
fn test_absent_device_is_unavailable() {
    let err = SimBackend::new(SimProfile::Absent).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::DeviceUnavailable);

    let config = EngineConfig::builder().profile(SimProfile::Absent).build();
    let mut handle = EngineHandle::new();
    assert_eq!(handle.initialize(&config, RUNNING_AVERAGE_CL).code(), 0);
    assert!(handle.last_error().unwrap().is_device_unavailable());
}

#[test]
fn test_compilation_failure_carries_log() {
    let backend = SimBackend::new(SimProfile::Discrete).unwrap();
    let source = "__kernel void fillZero(__global float* w) { w[get_global_id(0)] = 0; }";
    let err = RunningAverageEngine::initialize(backend, source, &EngineConfig::default())
        .err()
        .unwrap();

    match err {
        StreamAvgError::CompilationFailure { kernel_log } => {
            assert!(kernel_log.contains("UpdateWeights"), "log: {}", kernel_log);
        }
        other => panic!("expected compilation failure, got {:?}", other),
    }

    assert_eq!(init_with_fault(Fault::Compilation).kind(), ErrorKind::Compilation);
}

#[test]
fn test_allocation_failure_is_fatal_to_init() {
    assert_eq!(init_with_fault(Fault::Allocation).kind(), ErrorKind::Allocation);

    // Zero-fill enqueue is part of initialization.
    assert_eq!(init_with_fault(Fault::Dispatch).kind(), ErrorKind::Dispatch);
}

#[test]
fn test_dispatch_failure_preserves_state() {
    let mut engine = engine(4);
    engine.update(&[4.0, 4.0, 4.0, 4.0], 1).unwrap();
    let device_before = engine.readback().unwrap();
    let host_before = engine.host_weights().to_vec();

    engine.backend_mut().inject_fault(Fault::Dispatch);
    let err = engine.update(&[8.0, 8.0, 8.0, 8.0], 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dispatch);

    assert_eq!(engine.updates(), 1);
    assert_eq!(engine.readback().unwrap(), device_before);
    assert_eq!(engine.host_weights(), host_before.as_slice());

    // The same iteration can be retried.
    engine.update(&[8.0, 8.0, 8.0, 8.0], 2).unwrap();
    assert_eq!(engine.readback().unwrap(), vec![6.0; 4]);
}

#[test]
fn test_invalid_arguments_preserve_state() {
    let mut engine = engine(3);
    engine.step(&[3.0, 6.0, 9.0]).unwrap();

    assert!(matches!(
        engine.update(&[1.0, 2.0], 2),
        Err(StreamAvgError::InvalidSample {
            expected: 3,
            actual: 2
        })
    ));
    assert!(matches!(
        engine.update(&[1.0, 2.0, 3.0], 1),
        Err(StreamAvgError::IterationMismatch {
            expected: 2,
            actual: 1
        })
    ));
    assert!(matches!(
        engine.update(&[1.0, 2.0, 3.0], 0),
        Err(StreamAvgError::IterationMismatch { .. })
    ));

    assert_eq!(engine.updates(), 1);
    assert_eq!(engine.readback().unwrap(), vec![3.0, 6.0, 9.0]);
    assert_eq!(engine.host_weights(), &[3.0, 6.0, 9.0]);
}

#[test]
fn test_map_failure_is_fatal_to_report_only() {
    let mut engine = engine(2);
    engine.step(&[1.0, 1.0]).unwrap();

    engine.backend_mut().inject_fault(Fault::Map);
    assert_eq!(engine.report().unwrap_err().kind(), ErrorKind::Map);

    let report = engine.report().unwrap();
    assert_eq!(report.updates, 1);
    assert_eq!(report.relative_error_pct(), 0.0);
}

#[test]
fn test_handle_reports_failures_as_codes() {
    let config = EngineConfig::builder().capacity_limit(2).build();
    let mut handle = EngineHandle::new();
    assert_eq!(handle.initialize(&config, RUNNING_AVERAGE_CL), InitStatus::Discrete);

    assert_eq!(handle.update(&[1.0], 1), UpdateStatus::Failure);
    assert_eq!(
        handle.last_error().map(|e| e.kind()),
        Some(ErrorKind::Dispatch)
    );
    assert_eq!(handle.update(&[1.0, 1.0], 1), UpdateStatus::Success);

    assert_eq!(handle.initialize(&config, "not a kernel"), InitStatus::Failure);
    assert!(!handle.is_initialized());
    assert_eq!(
        handle.last_error().map(|e| e.kind()),
        Some(ErrorKind::Compilation)
    );
}

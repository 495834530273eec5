//! `streamavg run` command - Feed random samples through the engine.

use std::fs;
use std::path::Path;

use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use streamavg::kernels::RUNNING_AVERAGE_CL;
use streamavg::{ConsistencyReport, EngineConfig, StreamEngine};

use crate::error::CliResult;

/// Relative error (in percent) above which the run is flagged.
const ERROR_THRESHOLD_PCT: f64 = 1e-2;

/// Execute the `run` command.
pub async fn execute(
    config: EngineConfig,
    kernel: Option<&Path>,
    iterations: u32,
    seed: Option<u64>,
) -> CliResult<()> {
    let source = match kernel {
        Some(path) => fs::read_to_string(path)?,
        None => RUNNING_AVERAGE_CL.to_string(),
    };
    let seed = seed.unwrap_or_else(rand::random);

    println!(
        "{} Running {} update(s) on the {} backend (seed {})",
        "→".bright_cyan(),
        iterations.to_string().bright_white(),
        config.backend.to_string().bright_white(),
        seed
    );

    // The engine blocks on compilation and readback; keep it off the runtime threads.
    let report =
        tokio::task::spawn_blocking(move || drive(&config, &source, iterations, seed)).await??;

    println!();
    println!("{}", report);
    println!();
    print_verdict(&report);
    Ok(())
}

/// Apply `iterations` random samples in `[-1, 1)` and report.
fn drive(
    config: &EngineConfig,
    source: &str,
    iterations: u32,
    seed: u64,
) -> CliResult<ConsistencyReport> {
    let mut engine = streamavg::connect(config, source)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sample = vec![0.0f32; engine.vector_size()];

    for _ in 0..iterations {
        sample
            .iter_mut()
            .for_each(|x| *x = rng.gen_range(-1.0f32..1.0));
        engine.step(&sample)?;
    }
    info!("Applied {} update(s)", engine.updates());

    Ok(engine.report()?)
}

fn print_verdict(report: &ConsistencyReport) {
    let error = report.relative_error_pct();
    if error <= ERROR_THRESHOLD_PCT {
        println!(
            "{} Device matches host ({:.6}% relative error)",
            "✓".bright_green().bold(),
            error
        );
    } else {
        println!(
            "{} Device deviates from host ({:.6}% relative error)",
            "!".yellow().bold(),
            error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamavg::SimProfile;

    #[test]
    fn test_drive_is_reproducible() {
        let config = EngineConfig::builder()
            .profile(SimProfile::Unified)
            .capacity_limit(32)
            .build();

        let a = drive(&config, RUNNING_AVERAGE_CL, 10, 5).unwrap();
        let b = drive(&config, RUNNING_AVERAGE_CL, 10, 5).unwrap();
        assert_eq!(a.updates, 10);
        assert_eq!(a.host_head, b.host_head);
        assert_eq!(a.device_head, b.device_head);
        assert!(a.relative_error_pct() <= ERROR_THRESHOLD_PCT);
    }

    #[test]
    fn test_drive_without_updates() {
        let config = EngineConfig::builder().capacity_limit(4).build();
        let report = drive(&config, RUNNING_AVERAGE_CL, 0, 1).unwrap();
        assert_eq!(report.updates, 0);
        assert_eq!(report.device_head, vec![0.0; 4]);
        assert_eq!(report.relative_error_pct(), 0.0);
    }
}

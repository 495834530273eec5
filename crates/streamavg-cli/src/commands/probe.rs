//! `streamavg probe` command - Show device capabilities and the residency plan.

use colored::Colorize;

use streamavg::{BackendKind, ComputeBackend, EngineConfig, OpenClBackend, ResidencyPlan, SimBackend};

use super::{format_bytes, print_field};
use crate::error::CliResult;

/// Execute the `probe` command.
pub async fn execute(config: EngineConfig) -> CliResult<()> {
    match config.backend {
        BackendKind::Simulated => describe(&SimBackend::new(config.profile)?, &config),
        BackendKind::OpenCl => describe(&OpenClBackend::probe()?, &config),
    }
}

fn describe<B: ComputeBackend>(backend: &B, config: &EngineConfig) -> CliResult<()> {
    let caps = backend.capabilities();
    let plan = ResidencyPlan::from_capabilities(caps)?.clamped(config.capacity_limit)?;

    println!("{} {} backend", "→".bright_cyan(), backend.kind().to_string().bright_white());
    println!();

    println!("{}", "Device".bold());
    print_field("Platform", &caps.platform_name);
    print_field("Name", caps.name.bright_white());
    print_field("Compute units", caps.compute_units);
    print_field("Global memory", format_bytes(caps.global_mem_bytes));
    print_field("Local memory", format_bytes(caps.local_mem_bytes));
    print_field("Max allocation", format_bytes(caps.max_alloc_bytes));
    print_field("Memory model", caps.memory_model().to_string().bright_yellow());
    println!();

    println!("{}", "Residency plan".bold());
    print_field("Vector capacity", format!("{} elements", plan.size));
    print_field("Bytes per vector", format_bytes(plan.vector_bytes() as u64));
    print_field("Weight buffer", plan.weights);
    print_field("Input buffer", plan.input);

    Ok(())
}

//! streamavg CLI - drive the running-average engine from the command line.
//!
//! # Commands
//!
//! - `streamavg probe` - Show device capabilities and the residency plan
//! - `streamavg run` - Feed random samples through the engine and print the report
//! - `streamavg init` - Write a default `streamavg.toml`
//! - `streamavg completions <shell>` - Generate shell completions
//!
//! # Examples
//!
//! ```bash
//! # Inspect the simulated unified-memory device
//! streamavg probe --profile unified
//!
//! # 500 updates on a 4096-element vector with a fixed seed
//! streamavg run --iterations 500 --capacity 4096 --seed 7
//!
//! # Use a real GPU (build with --features opencl)
//! streamavg run --backend opencl --kernel ./running_average.cl
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use streamavg::{BackendKind, EngineConfig, SimProfile, DEFAULT_CONFIG_FILE};

mod commands;
mod error;

use commands::{init, probe, run};
use error::CliResult;

/// streamavg CLI - streaming running average on a compute device
#[derive(Parser)]
#[command(name = "streamavg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show device capabilities and the residency plan
    Probe {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Feed random samples through the engine and print the report
    Run {
        #[command(flatten)]
        device: DeviceArgs,

        /// Number of samples to apply
        #[arg(short, long, default_value = "100")]
        iterations: u32,

        /// Seed for the sample generator (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Kernel source file (default: bundled kernels)
        #[arg(short, long)]
        kernel: Option<PathBuf>,

        /// Number of leading elements shown in the report
        #[arg(long)]
        head: Option<usize>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Device selection shared by `probe` and `run`.
#[derive(Args)]
struct DeviceArgs {
    /// Backend to use
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Simulated device profile
    #[arg(short, long, value_enum)]
    profile: Option<ProfileArg>,

    /// Upper bound on the vector capacity
    #[arg(long)]
    capacity: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Simulated,
    Opencl,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Discrete,
    Unified,
    Absent,
}

impl DeviceArgs {
    /// Apply command-line overrides on top of the file configuration.
    fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(backend) = self.backend {
            config.backend = match backend {
                BackendArg::Simulated => BackendKind::Simulated,
                BackendArg::Opencl => BackendKind::OpenCl,
            };
        }
        if let Some(profile) = self.profile {
            config.profile = match profile {
                ProfileArg::Discrete => SimProfile::Discrete,
                ProfileArg::Unified => SimProfile::Unified,
                ProfileArg::Absent => SimProfile::Absent,
            };
        }
        if let Some(capacity) = self.capacity {
            config.capacity_limit = Some(capacity);
        }
        config
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(cli: &Cli) -> CliResult<EngineConfig> {
    Ok(EngineConfig::load(&cli.config)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Probe { device } => match load_config(&cli) {
            Ok(config) => probe::execute(device.apply(config)).await,
            Err(e) => Err(e),
        },

        Commands::Run {
            device,
            iterations,
            seed,
            kernel,
            head,
        } => match load_config(&cli) {
            Ok(mut config) => {
                if let Some(head) = head {
                    config.report_head = *head;
                }
                run::execute(device.apply(config), kernel.as_deref(), *iterations, *seed).await
            }
            Err(e) => Err(e),
        },

        Commands::Init { force } => init::execute(&cli.config, *force).await,

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "streamavg",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_device_overrides() {
        let cli = Cli::parse_from([
            "streamavg",
            "run",
            "--backend",
            "opencl",
            "--profile",
            "unified",
            "--capacity",
            "64",
        ]);
        let Commands::Run { device, .. } = cli.command else {
            panic!("expected run command");
        };

        let config = device.apply(EngineConfig::default());
        assert_eq!(config.backend, BackendKind::OpenCl);
        assert_eq!(config.profile, SimProfile::Unified);
        assert_eq!(config.capacity_limit, Some(64));
    }

    #[test]
    fn test_no_overrides_keep_file_config() {
        let cli = Cli::parse_from(["streamavg", "probe"]);
        let Commands::Probe { device } = cli.command else {
            panic!("expected probe command");
        };

        let file = EngineConfig::builder().capacity_limit(8).build();
        assert_eq!(device.apply(file.clone()), file);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }
}

//! `streamavg init` command - Write a default configuration file.

use std::fs;
use std::path::Path;

use colored::Colorize;

use crate::error::{CliError, CliResult};

const DEFAULT_CONFIG: &str = r#"# streamavg engine configuration

# Backend running the device side: "simulated" or "opencl"
backend = "simulated"

# Capability profile of the simulated device: "discrete", "unified" or "absent"
profile = "discrete"

# Upper bound on the vector capacity chosen from the device's max allocation
# capacity_limit = 4096

# Leading elements shown in the report
report_head = 10

# Options passed to the device compiler
build_options = ""
"#;

/// Execute the `init` command.
pub async fn execute(path: &Path, force: bool) -> CliResult<()> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        )));
    }

    fs::write(path, DEFAULT_CONFIG)?;
    println!(
        "  {} Created {}",
        "✓".bright_green(),
        path.display().to_string().bright_white()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamavg::EngineConfig;

    #[test]
    fn test_default_file_parses_to_defaults() {
        let config = EngineConfig::from_toml_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}

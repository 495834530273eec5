//! Engine configuration.
//!
//! Loaded from a TOML file (`streamavg.toml` by default). Every field is
//! optional in the file; missing fields take their defaults.
//!
//! ```toml
//! backend = "simulated"
//! profile = "discrete"
//! capacity_limit = 4096
//! report_head = 10
//! build_options = ""
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use streamavg_core::backend::BackendKind;
use streamavg_core::error::{Result, StreamAvgError};
use streamavg_sim::SimProfile;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "streamavg.toml";

/// Configuration for a [`RunningAverageEngine`](crate::RunningAverageEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Backend to run the device side on.
    #[serde(default)]
    pub backend: BackendKind,

    /// Capability profile of the simulated backend.
    #[serde(default)]
    pub profile: SimProfile,

    /// Upper bound on the vector capacity chosen by the residency strategy.
    #[serde(default)]
    pub capacity_limit: Option<usize>,

    /// Number of leading elements shown in the text report.
    #[serde(default = "default_report_head")]
    pub report_head: usize,

    /// Options passed to the device compiler.
    #[serde(default)]
    pub build_options: String,
}

fn default_report_head() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            profile: SimProfile::default(),
            capacity_limit: None,
            report_head: default_report_head(),
            build_options: String::new(),
        }
    }
}

impl EngineConfig {
    /// Start building a configuration from defaults.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| StreamAvgError::InvalidConfig(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            StreamAvgError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StreamAvgError::InvalidConfig(e.to_string()))
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.capacity_limit == Some(0) {
            return Err(StreamAvgError::InvalidConfig(
                "capacity_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend.
    #[must_use]
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the simulated device profile.
    #[must_use]
    pub fn profile(mut self, profile: SimProfile) -> Self {
        self.config.profile = profile;
        self
    }

    /// Cap the vector capacity.
    #[must_use]
    pub fn capacity_limit(mut self, limit: usize) -> Self {
        self.config.capacity_limit = Some(limit);
        self
    }

    /// Set the number of elements shown in reports.
    #[must_use]
    pub fn report_head(mut self, head: usize) -> Self {
        self.config.report_head = head;
        self
    }

    /// Set device compiler options.
    #[must_use]
    pub fn build_options(mut self, options: impl Into<String>) -> Self {
        self.config.build_options = options.into();
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.backend, BackendKind::Simulated);
        assert_eq!(config.profile, SimProfile::Discrete);
        assert_eq!(config.capacity_limit, None);
        assert_eq!(config.report_head, 10);
        assert!(config.build_options.is_empty());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(
            EngineConfig::from_toml_str("").unwrap(),
            EngineConfig::default()
        );
    }

    #[test]
    fn test_parse() {
        let config = EngineConfig::from_toml_str(
            r#"
            backend = "opencl"
            profile = "unified"
            capacity_limit = 64
            report_head = 3
            build_options = "-cl-fast-relaxed-math"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::OpenCl);
        assert_eq!(config.profile, SimProfile::Unified);
        assert_eq!(config.capacity_limit, Some(64));
        assert_eq!(config.report_head, 3);
        assert_eq!(config.build_options, "-cl-fast-relaxed-math");
    }

    #[test]
    fn test_invalid() {
        assert!(EngineConfig::from_toml_str("backend = \"cuda\"").is_err());
        assert!(EngineConfig::from_toml_str("capacity_limit = 0").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::builder()
            .profile(SimProfile::Unified)
            .capacity_limit(128)
            .report_head(4)
            .build();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = EngineConfig::load("/nonexistent/streamavg.toml").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}

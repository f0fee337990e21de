//! # Configuration File
//!
//! The global `--config` file holds default compile settings: the root
//! module plus any [`CompileOptions`] field, in kebab-case YAML. Command-line
//! flags override it.
//!
//! ```yaml
//! root: example-system
//! config-only: true
//! draft: "2019-09"
//! layout: split
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use ysc_compiler::CompileOptions;

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliConfig {
    /// Module to compile when `--root` is not given.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(flatten)]
    pub options: CompileOptions,
}

/// Load the configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: CliConfig =
        serde_yaml::from_str(&content).with_context(|| format!("invalid config file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?config, "loaded configuration");
    Ok(config)
}

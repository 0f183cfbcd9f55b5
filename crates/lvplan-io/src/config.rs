//! TOML configuration loading.

use anyhow::{Context, Result};
use lvplan_core::PlanningConfig;
use std::path::Path;
use tracing::debug;

/// Parse and validate a planning configuration.
pub fn parse_config(text: &str) -> Result<PlanningConfig> {
    let config: PlanningConfig = toml::from_str(text).context("parsing planning configuration")?;
    config.validate().context("validating planning configuration")?;
    Ok(config)
}

/// Load a planning configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<PlanningConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = parse_config(&text).with_context(|| format!("in {}", path.display()))?;
    debug!(
        resolution = config.routing.resolution,
        mode = config.routing.mode.as_str(),
        "configuration loaded"
    );
    Ok(config)
}

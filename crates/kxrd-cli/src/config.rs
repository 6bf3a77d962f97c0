//! Config file loading.
//!
//! A config file is YAML holding any subset of the conversion options:
//!
//! ```yaml
//! group: platform.example.org
//! version: v1beta1
//! with_claims: true
//! categories: [crossplane]
//! ```

use std::path::Path;

use anyhow::{Context, Result};

use kxrd_schema::ConversionOptions;

/// Load conversion options from a YAML file.
pub fn load_config(path: &Path) -> Result<ConversionOptions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(ConversionOptions::default());
    }
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

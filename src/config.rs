use serde::Deserialize;
use std::fs;
use tracing::debug;

use crate::error::Result;

/// Pipeline configuration, loaded from a TOML file with per-field defaults.
/// CLI flags override whatever the file provides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path to the events source file
    pub events_file: String,
    /// Path to the venues source file
    pub venues_file: String,
    /// Directory the output artifacts are written to
    pub output_dir: String,
    /// Version stamp recorded in the manifest
    pub dataset_version: String,
    /// Co-billed artist count above which a data-quality warning is raised
    pub max_cobilled_artists: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            events_file: "data/events.txt".to_string(),
            venues_file: "data/venues.txt".to_string(),
            output_dir: "output".to_string(),
            dataset_version: "1".to_string(),
            max_cobilled_artists: 8,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load a config file if present, falling back to the defaults.
    pub fn load_or_default(path: &str) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                debug!("no config loaded from '{}' ({}), using defaults", path, e);
                Self::default()
            }
        }
    }
}

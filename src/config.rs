// src/config.rs

use crate::types::Config;
use anyhow::Result;
use std::fs;
use std::path::Path;

impl Config {
    /// Load calibration overrides from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::health::ThresholdConfig;

pub const DEFAULT_CONFIG_FILE: &str = "healthgate.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub tool_name: Option<String>,
    pub fail_below: Option<u8>,
    pub health: Option<ThresholdConfig>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    /// `Ok(None)` only when no config file exists.
    pub fn discover() -> anyhow::Result<Option<Self>> {
        Self::discover_in(Path::new("."))
    }

    pub fn discover_in(dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = dir.join(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Config::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }
}

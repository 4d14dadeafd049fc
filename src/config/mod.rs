use std::{fs, path::Path};

use regex::Regex;
use serde::Deserialize;

use crate::core::error::ScanError;

pub const DEFAULT_CONFIG_PATH: &str = "config/printscope.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExportConfig {
    pub version: String,
    pub disclaimer: String,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PrivacyConfig {
    /// Drop `canvas.rawDataURL` from exported bundles.
    #[serde(default)]
    pub strip_raw_canvas: bool,
    /// WebRTC addresses and device labels matching any of these are replaced
    /// with `[redacted]` in exports.
    #[serde(default)]
    pub redact_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    pub export: ExportConfig,
    #[serde(default)]
    pub privacy: PrivacyConfig,
}

impl PrivacyConfig {
    pub fn compiled_patterns(&self) -> Result<Vec<Regex>, ScanError> {
        self.redact_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(ScanError::from))
            .collect()
    }
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig, ScanError> {
    let path = path.map(Path::new).unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

    if !path.exists() {
        return Ok(default_config());
    }

    let content = fs::read_to_string(path).map_err(|e| ScanError::Config(e.to_string()))?;
    let cfg: AppConfig = toml::from_str(&content)?;
    // reject bad patterns at load time rather than mid-export
    cfg.privacy.compiled_patterns()?;
    Ok(cfg)
}

fn default_pretty() -> bool {
    true
}

pub fn default_config() -> AppConfig {
    AppConfig {
        export: ExportConfig {
            version: "1.0.0".to_string(),
            disclaimer: "This report was generated by printscope for personal use. \
                         All data was processed locally."
                .to_string(),
            pretty: true,
        },
        privacy: PrivacyConfig::default(),
    }
}

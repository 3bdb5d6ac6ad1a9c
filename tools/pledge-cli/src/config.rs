//! CLI configuration.

use anyhow::{Context, Result};
use pledge_commerce::settings::PledgeSettings;
use serde::{Deserialize, Serialize};

/// Config file names, in lookup order.
pub const CONFIG_NAMES: [&str; 3] = ["pledge.toml", ".pledge.toml", "pledge.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Default catalog file, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// Pledge display and limit settings.
    #[serde(default)]
    pub settings: PledgeSettings,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(&content, path)
    }

    /// Parse config content, picking the format from the file name.
    pub fn parse(content: &str, path: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }
}

/// Generate a default pledge.toml config file.
pub fn generate_default_config(catalog: &str) -> String {
    format!(
        r#"# Pledge CLI configuration

catalog = "{catalog}"

[settings]
locale = "en-US"
show_converted = true
# Overrides in project minor units (cents for USD)
# min_pledge_override = 100
# max_pledge_override = 1000000
"#,
        catalog = catalog
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = CliConfig::parse(&generate_default_config("rewards.toml"), "pledge.toml").unwrap();
        assert_eq!(config.catalog.as_deref(), Some("rewards.toml"));
        assert_eq!(config.settings, PledgeSettings::default());
    }

    #[test]
    fn test_json_config() {
        let config = CliConfig::parse(
            r#"{"settings": {"locale": "de-DE", "min_pledge_override": 500}}"#,
            "pledge.json",
        )
        .unwrap();
        assert!(config.catalog.is_none());
        assert_eq!(config.settings.locale, "de-DE");
        assert_eq!(config.settings.min_pledge_override, Some(500));
        assert!(config.settings.show_converted);
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(CliConfig::parse("", "pledge.toml").unwrap(), CliConfig::default());
    }
}

//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use pledge_commerce::catalog::RewardCatalog;
use pledge_commerce::fx::{format_converted_or_raw, format_or_raw, StandardFormatter};
use pledge_commerce::settings::PledgeLimits;
use pledge_commerce::Money;
use tracing::debug;

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the config was loaded from, if anywhere.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        debug!(path = %config_path.display(), "loaded config");
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Resolve a path taken from the config file, relative to that file.
    pub fn resolve_config_path(&self, path: &str) -> PathBuf {
        match self.config_path.as_deref().and_then(Path::parent) {
            Some(dir) if !Path::new(path).is_absolute() => {
                let base = if dir.is_absolute() { dir.to_path_buf() } else { self.cwd.join(dir) };
                base.join(path)
            }
            _ => self.resolve_path(path),
        }
    }

    /// Catalog path from the command line, falling back to the config.
    pub fn catalog_path(&self, arg: Option<&str>) -> Result<PathBuf> {
        match (arg, self.config.catalog.as_deref()) {
            (Some(path), _) => Ok(self.resolve_path(path)),
            (None, Some(path)) => Ok(self.resolve_config_path(path)),
            (None, None) => bail!("No catalog given. Pass --catalog or set `catalog` in pledge.toml."),
        }
    }

    /// Load and validate a catalog (TOML, or JSON by extension).
    pub fn load_catalog(&self, arg: Option<&str>) -> Result<Arc<RewardCatalog>> {
        let path = self.catalog_path(arg)?;
        self.output.debug(&format!("Using catalog {}", path.display()));
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

        let catalog = if path.extension().map_or(false, |e| e == "json") {
            RewardCatalog::from_json_str(&content)
        } else {
            RewardCatalog::from_toml_str(&content)
        }
        .with_context(|| format!("Invalid catalog: {}", path.display()))?;

        debug!(
            path = %path.display(),
            rewards = catalog.rewards.len(),
            add_ons = catalog.add_ons.len(),
            "loaded catalog"
        );
        Ok(Arc::new(catalog))
    }

    /// Pledge limits for a catalog with config overrides applied.
    pub fn limits(&self, catalog: &RewardCatalog) -> PledgeLimits {
        PledgeLimits::for_project(&catalog.project, &self.config.settings)
    }

    /// Format money for the configured locale.
    pub fn money(&self, money: &Money) -> String {
        format_or_raw(&StandardFormatter, money, &self.config.settings.locale)
    }

    /// Format money with its converted amount, when the catalog has a rate.
    pub fn money_with_converted(&self, money: &Money, catalog: &RewardCatalog) -> String {
        let formatted = self.money(money);
        match &catalog.project.fx {
            Some(fx) if self.config.settings.show_converted => format!(
                "{} ({})",
                formatted,
                format_converted_or_raw(&StandardFormatter, money, fx, &self.config.settings.locale)
            ),
            _ => formatted,
        }
    }
}

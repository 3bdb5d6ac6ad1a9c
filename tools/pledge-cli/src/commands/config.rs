//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use pledge_commerce::fx::{MoneyFormatter, StandardFormatter};
use pledge_commerce::{Currency, Money};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig, CONFIG_NAMES};
use crate::context::Context;

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Get { key } => get_config(&key, ctx),
        ConfigCommand::Set { key, value } => set_config(&key, &value, ctx),
        ConfigCommand::Init { catalog, force } => init_config(&catalog, force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Current Configuration");

    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }
    ctx.output
        .kv("catalog", ctx.config.catalog.as_deref().unwrap_or("(not set)"));

    let settings = &ctx.config.settings;
    ctx.output.info("");
    ctx.output.info("[settings]");
    ctx.output.kv("locale", &settings.locale);
    ctx.output.kv("show_converted", &settings.show_converted.to_string());
    if let Some(min) = settings.min_pledge_override {
        ctx.output.kv("min_pledge_override", &min.to_string());
    }
    if let Some(max) = settings.max_pledge_override {
        ctx.output.kv("max_pledge_override", &max.to_string());
    }

    Ok(())
}

fn get_config(key: &str, ctx: &Context) -> Result<()> {
    let value = get_config_value(&ctx.config, key)?;

    if ctx.output.is_json() {
        println!("{}", serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

fn set_config(key: &str, value: &str, ctx: &Context) -> Result<()> {
    let config_path = match &ctx.config_path {
        Some(path) => path.to_string_lossy().to_string(),
        None => find_config_file(&ctx.cwd)?,
    };

    let mut config = CliConfig::load(&config_path)?;
    set_config_value(&mut config, key, value)?;
    config.save(&config_path)?;

    ctx.output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn init_config(catalog: &str, force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config(catalog))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));
    if !ctx.resolve_path(catalog).exists() {
        ctx.output.warn(&format!("Catalog {} does not exist yet", catalog));
    }

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    let settings = &ctx.config.settings;

    // Locale must be one the formatter knows
    let probe = Money::new(100, Currency::USD);
    if StandardFormatter.format(&probe, &settings.locale).is_err() {
        warnings.push(format!(
            "settings.locale '{}' is not supported; amounts will show unformatted",
            settings.locale
        ));
    }

    if settings.min_pledge_override.map_or(false, |min| min < 0) {
        errors.push("settings.min_pledge_override cannot be negative".to_string());
    }
    if let (Some(min), Some(max)) = (settings.min_pledge_override, settings.max_pledge_override) {
        if max < min {
            errors.push("settings.max_pledge_override is below min_pledge_override".to_string());
        }
    }

    match &ctx.config.catalog {
        Some(path) if !ctx.resolve_config_path(path).exists() => {
            errors.push(format!("catalog '{}' does not exist", path));
        }
        None => warnings.push("catalog is not set; commands will need --catalog".to_string()),
        _ => {}
    }

    // Print results
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

fn get_config_value(config: &CliConfig, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split('.').collect();
    let optional = |value: Option<i64>| value.map_or_else(|| "null".to_string(), |v| v.to_string());

    match parts.as_slice() {
        ["catalog"] => Ok(config
            .catalog
            .as_ref()
            .map(|c| format!("\"{}\"", c))
            .unwrap_or_else(|| "null".to_string())),
        ["settings", "locale"] => Ok(format!("\"{}\"", config.settings.locale)),
        ["settings", "show_converted"] => Ok(config.settings.show_converted.to_string()),
        ["settings", "min_pledge_override"] => Ok(optional(config.settings.min_pledge_override)),
        ["settings", "max_pledge_override"] => Ok(optional(config.settings.max_pledge_override)),
        _ => bail!("Unknown config key: {}", key),
    }
}

fn set_config_value(config: &mut CliConfig, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let optional = |value: &str| -> Result<Option<i64>> {
        if value == "null" || value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value.parse()?))
        }
    };

    match parts.as_slice() {
        ["catalog"] => config.catalog = Some(value.to_string()),
        ["settings", "locale"] => config.settings.locale = value.to_string(),
        ["settings", "show_converted"] => config.settings.show_converted = value.parse()?,
        ["settings", "min_pledge_override"] => config.settings.min_pledge_override = optional(value)?,
        ["settings", "max_pledge_override"] => config.settings.max_pledge_override = optional(value)?,
        _ => bail!("Unknown or read-only config key: {}", key),
    }

    Ok(())
}

fn find_config_file(cwd: &std::path::Path) -> Result<String> {
    for name in &CONFIG_NAMES {
        let path = cwd.join(name);
        if path.exists() {
            return Ok(path.to_string_lossy().to_string());
        }
    }
    bail!("No config file found. Run `pledge config init` to create one.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set_values() {
        let mut config = CliConfig::default();
        assert_eq!(get_config_value(&config, "catalog").unwrap(), "null");

        set_config_value(&mut config, "catalog", "rewards.toml").unwrap();
        set_config_value(&mut config, "settings.show_converted", "false").unwrap();
        set_config_value(&mut config, "settings.min_pledge_override", "250").unwrap();

        assert_eq!(get_config_value(&config, "catalog").unwrap(), "\"rewards.toml\"");
        assert_eq!(get_config_value(&config, "settings.show_converted").unwrap(), "false");
        assert_eq!(
            get_config_value(&config, "settings.min_pledge_override").unwrap(),
            "250"
        );

        set_config_value(&mut config, "settings.min_pledge_override", "null").unwrap();
        assert_eq!(config.settings.min_pledge_override, None);
    }

    #[test]
    fn test_unknown_keys() {
        let mut config = CliConfig::default();
        assert!(get_config_value(&config, "settings.nope").is_err());
        assert!(set_config_value(&mut config, "project.id", "x").is_err());
        assert!(set_config_value(&mut config, "settings.show_converted", "maybe").is_err());
    }
}

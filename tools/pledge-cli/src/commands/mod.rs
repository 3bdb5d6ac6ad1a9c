//! CLI command implementations.

pub mod config;
pub mod quote;
pub mod rewards;
pub mod validate;

use clap::{Args, Subcommand};

/// Arguments for the rewards command.
#[derive(Args)]
pub struct RewardsArgs {
    /// Catalog file (TOML or JSON).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Include sold-out and unavailable rewards.
    #[arg(short, long)]
    pub all: bool,

    /// Also list add-ons.
    #[arg(long)]
    pub add_ons: bool,
}

/// Arguments for the quote command.
#[derive(Args)]
pub struct QuoteArgs {
    /// Catalog file (TOML or JSON).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Base reward id (prompted for when omitted on a terminal).
    #[arg(short, long, conflicts_with = "no_reward")]
    pub reward: Option<String>,

    /// Pledge without a reward.
    #[arg(long)]
    pub no_reward: bool,

    /// Add-on as `id` or `id=quantity` (repeatable).
    #[arg(short, long = "add-on")]
    pub add_ons: Vec<String>,

    /// Shipping location id (e.g. `us`).
    #[arg(short, long)]
    pub location: Option<String>,

    /// Bonus support in major units (e.g. `5` or `2.50`).
    #[arg(short, long)]
    pub bonus: Option<String>,

    /// Stop at the confirmation summary instead of finalizing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Catalog file (TOML or JSON).
    pub catalog: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Get a config value.
    Get {
        /// Config key (dot-separated).
        key: String,
    },
    /// Set a config value.
    Set {
        /// Config key (dot-separated).
        key: String,
        /// Value to set.
        value: String,
    },
    /// Initialize a new config file.
    Init {
        /// Default catalog path to write into the config.
        #[arg(long, default_value = "catalog.toml")]
        catalog: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}

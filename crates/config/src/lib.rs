//! Configuration loading, env substitution, env overrides, and startup validation.
//!
//! Config files: `linkrelay.toml`, `linkrelay.yaml`, or `linkrelay.json`
//! Searched in `./` then `~/.config/linkrelay/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values. The process
//! environment (`BOT_TOKEN`, `CHANNEL_ID`, ...) is applied on top.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, discover_and_load, find_config_file, load_config},
    schema::{BrowserConfig, RelayConfig, ResolverConfig, TelegramConfig},
    validate::{ConfigError, validate},
};

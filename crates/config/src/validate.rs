//! Startup validation of required settings.

use {secrecy::ExposeSecret, thiserror::Error};

use crate::schema::RelayConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Every required setting that is absent, by its environment variable name.
    #[error("required settings are missing: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Check that the bot can start. All missing settings are reported at once.
pub fn validate(config: &RelayConfig) -> Result<(), ConfigError> {
    let tg = &config.telegram;
    let mut missing = Vec::new();

    if tg.token.expose_secret().trim().is_empty() {
        missing.push("BOT_TOKEN");
    }
    if tg.channel_id.trim().is_empty() {
        missing.push("CHANNEL_ID");
    }
    if tg.operator_id == 0 {
        missing.push("ADMIN_USER_ID");
    }
    if tg.channel_mention().is_empty() {
        missing.push("CHANNEL_USERNAME");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Missing(missing))
    }
}

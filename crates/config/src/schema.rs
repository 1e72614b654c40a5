//! Config schema types.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Desktop Chrome user agent presented by both resolution tiers.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub telegram: TelegramConfig,
    pub resolver: ResolverConfig,
    pub browser: BrowserConfig,
}

/// Bot credentials, destination channel and the single operator identity.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Destination channel: numeric chat id (`-100...`) or `@username`.
    pub channel_id: String,

    /// Channel handle appended to every post as `@<channel_username>`.
    pub channel_username: String,

    /// Telegram user id allowed to talk to the bot. 0 means unset.
    pub operator_id: u64,
}

impl TelegramConfig {
    /// Channel handle without a leading `@`.
    #[must_use]
    pub fn channel_mention(&self) -> &str {
        self.channel_username.trim().trim_start_matches('@')
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .field("channel_username", &self.channel_username)
            .field("operator_id", &self.operator_id)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            channel_id: String::new(),
            channel_username: String::new(),
            operator_id: 0,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Plain HTTP tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Whole-request timeout including redirect hops.
    pub http_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Headless browser tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Set to false to skip the browser tier entirely.
    pub enabled: bool,
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    /// Cap on a single navigation.
    pub page_load_timeout_secs: u64,
    /// Cap on element lookups inside the page.
    pub element_wait_secs: u64,
    /// Delay between URL observations after navigation.
    pub poll_interval_secs: u64,
    pub poll_attempts: u32,
    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chrome_path: None,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_load_timeout_secs: 15,
            element_wait_secs: 5,
            poll_interval_secs: 2,
            poll_attempts: 5,
            chrome_args: Vec::new(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_resolution_budget() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.resolver.http_timeout_secs, 15);
        assert_eq!(cfg.browser.page_load_timeout_secs, 15);
        assert_eq!(cfg.browser.element_wait_secs, 5);
        assert_eq!(cfg.browser.poll_interval_secs, 2);
        assert_eq!(cfg.browser.poll_attempts, 5);
        assert!(cfg.browser.enabled);
        assert!(cfg.browser.headless);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = TelegramConfig {
            token: Secret::new("123:SECRET".into()),
            ..Default::default()
        };
        let out = format!("{cfg:?}");
        assert!(!out.contains("SECRET"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn channel_mention_strips_at() {
        let cfg = TelegramConfig {
            channel_username: " @coolstuff ".into(),
            ..Default::default()
        };
        assert_eq!(cfg.channel_mention(), "coolstuff");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: RelayConfig = toml::from_str(
            r#"
            [telegram]
            token = "1:x"
            operator_id = 42

            [browser]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.telegram.token.expose_secret(), "1:x");
        assert_eq!(cfg.telegram.operator_id, 42);
        assert!(!cfg.browser.enabled);
        assert_eq!(cfg.browser.viewport_width, 1920);
        assert_eq!(cfg.resolver.http_timeout_secs, 15);
    }
}

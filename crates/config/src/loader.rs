use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::RelayConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "linkrelay.toml",
    "linkrelay.yaml",
    "linkrelay.yml",
    "linkrelay.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<RelayConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./linkrelay.{toml,yaml,yml,json}`
/// 2. `~/.config/linkrelay/linkrelay.{toml,yaml,yml,json}`
///
/// Returns `RelayConfig::default()` if nothing is found or the file is
/// unreadable; the environment overrides usually carry the real values.
pub fn discover_and_load() -> RelayConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return RelayConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    load_config(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
        RelayConfig::default()
    })
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = directories::ProjectDirs::from("", "", "linkrelay")
        .map(|dirs| {
            let dir = dirs.config_dir().to_path_buf();
            CONFIG_FILENAMES
                .iter()
                .map(|name| dir.join(name))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    local.chain(global).find(|p| p.exists())
}

/// Apply process environment variables on top of file values.
pub fn apply_env_overrides(config: RelayConfig) -> RelayConfig {
    apply_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_overrides_with(
    mut config: RelayConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> RelayConfig {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(token) = get("BOT_TOKEN") {
        config.telegram.token = Secret::new(token);
    }
    if let Some(channel_id) = get("CHANNEL_ID") {
        config.telegram.channel_id = channel_id;
    }
    if let Some(username) = get("CHANNEL_USERNAME") {
        config.telegram.channel_username = username;
    }
    if let Some(raw) = get("ADMIN_USER_ID") {
        match raw.parse::<u64>() {
            Ok(id) => config.telegram.operator_id = id,
            Err(e) => warn!(value = %raw, error = %e, "ignoring unparsable ADMIN_USER_ID"),
        }
    }
    if let Some(path) = get("CHROME_PATH").or_else(|| get("CHROMEDRIVER_PATH")) {
        config.browser.chrome_path = Some(path);
    }

    config
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<RelayConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {secrecy::ExposeSecret, std::collections::HashMap};

    use super::*;

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linkrelay.toml");
        std::fs::write(
            &path,
            "[telegram]\nchannel_id = \"@links\"\nchannel_username = \"links\"\noperator_id = 7\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.telegram.channel_id, "@links");
        assert_eq!(cfg.telegram.operator_id, 7);
    }

    #[test]
    fn loads_json_and_yaml_files() {
        let dir = tempfile::tempdir().unwrap();

        let json = dir.path().join("linkrelay.json");
        std::fs::write(&json, r#"{"resolver": {"http_timeout_secs": 3}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().resolver.http_timeout_secs, 3);

        let yaml = dir.path().join("linkrelay.yaml");
        std::fs::write(&yaml, "browser:\n  poll_attempts: 2\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().browser.poll_attempts, 2);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linkrelay.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/linkrelay.toml")).is_err());
    }

    #[test]
    fn env_beats_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BOT_TOKEN", "99:env"),
            ("CHANNEL_ID", "-1001"),
            ("CHANNEL_USERNAME", "envchan"),
            ("ADMIN_USER_ID", "12345"),
            ("CHROMEDRIVER_PATH", "/opt/chrome"),
        ]);
        let mut file_cfg = RelayConfig::default();
        file_cfg.telegram.channel_id = "@file".into();

        let cfg = apply_overrides_with(file_cfg, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.telegram.token.expose_secret(), "99:env");
        assert_eq!(cfg.telegram.channel_id, "-1001");
        assert_eq!(cfg.telegram.channel_username, "envchan");
        assert_eq!(cfg.telegram.operator_id, 12345);
        assert_eq!(cfg.browser.chrome_path.as_deref(), Some("/opt/chrome"));
    }

    #[test]
    fn bad_operator_id_keeps_file_value() {
        let mut file_cfg = RelayConfig::default();
        file_cfg.telegram.operator_id = 5;
        let cfg = apply_overrides_with(file_cfg, |k| {
            (k == "ADMIN_USER_ID").then(|| "not-a-number".to_string())
        });
        assert_eq!(cfg.telegram.operator_id, 5);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut file_cfg = RelayConfig::default();
        file_cfg.telegram.channel_id = "@file".into();
        let cfg = apply_overrides_with(file_cfg, |_| Some("   ".to_string()));
        assert_eq!(cfg.telegram.channel_id, "@file");
    }
}

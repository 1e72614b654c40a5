use std::path::Path;

use {anyhow::Result, linkrelay_config::RelayConfig, secrecy::ExposeSecret};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Print the effective configuration with the token redacted, then validate.
pub fn check(explicit: Option<&Path>, config: &RelayConfig) -> Result<()> {
    match explicit
        .map(Path::to_path_buf)
        .or_else(linkrelay_config::find_config_file)
    {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults and environment.\n"),
    }

    let telegram = &config.telegram;
    let token = if telegram.token.expose_secret().is_empty() {
        "(missing)"
    } else {
        "[REDACTED]"
    };
    eprintln!("  telegram.token:            {token}");
    eprintln!("  telegram.channel_id:       {}", or_missing(&telegram.channel_id));
    eprintln!("  telegram.channel_username: {}", or_missing(&telegram.channel_username));
    eprintln!("  telegram.operator_id:      {}", telegram.operator_id);
    eprintln!("  resolver.http_timeout:     {}s", config.resolver.http_timeout_secs);

    let browser = &config.browser;
    eprintln!("  browser.enabled:           {}", browser.enabled);
    eprintln!(
        "  browser.chrome_path:       {}",
        browser.chrome_path.as_deref().unwrap_or("(auto-detect)")
    );
    eprintln!(
        "  browser.polling:           {} x {}s",
        browser.poll_attempts, browser.poll_interval_secs
    );
    eprintln!();

    match linkrelay_config::validate(config) {
        Ok(()) => {
            eprintln!("{BOLD}{GREEN}ok{RESET} configuration is complete");
            Ok(())
        },
        Err(e) => {
            eprintln!("{BOLD}{RED}error{RESET} {e}");
            Err(e.into())
        },
    }
}

fn or_missing(value: &str) -> &str {
    if value.trim().is_empty() {
        "(missing)"
    } else {
        value
    }
}

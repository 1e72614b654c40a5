//! `detect-browser`: report which Chrome/Chromium the browser tier would use.

use {
    anyhow::Result,
    linkrelay_browser::detect::detect_browser,
    linkrelay_config::BrowserConfig,
};

pub fn detect(config: &BrowserConfig) -> Result<()> {
    if !config.enabled {
        println!("Browser tier is disabled in config (browser.enabled = false).");
    }

    let result = detect_browser(config.chrome_path.as_deref());
    match result.path {
        Some(path) if result.found => {
            println!("Browser found: {}", path.display());
        },
        _ => {
            println!("Links will be resolved over HTTP only.\n");
            println!("{}", result.install_hint);
        },
    }
    Ok(())
}

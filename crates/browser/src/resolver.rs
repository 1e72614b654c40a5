//! Browser tier of redirect resolution.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use {
    async_trait::async_trait,
    chromiumoxide::Page,
    linkrelay_config::BrowserConfig,
    tracing::{debug, info, warn},
    url::Url,
};

use crate::{detect, error::BrowserError, session::BrowserSession};

/// URLs a fresh tab reports before it has navigated anywhere.
const PLACEHOLDER_URLS: &[&str] = &["about:blank", "data:,"];

/// Whether `url` is the address of a tab that has not loaded anything yet.
pub fn is_placeholder_url(url: &str) -> bool {
    PLACEHOLDER_URLS.contains(&url.trim())
}

/// Compare two URLs after parsing, so `http://a.com` equals `http://a.com/`.
/// Unparsable inputs fall back to exact string comparison.
pub fn same_url(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// The two things observation needs from a tab.
#[async_trait]
trait Tab: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;
    async fn address(&self) -> Result<Option<String>, BrowserError>;
}

#[async_trait]
impl Tab for Page {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.goto(url)
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))
    }

    async fn address(&self) -> Result<Option<String>, BrowserError> {
        Ok(self.url().await?)
    }
}

/// Resolves a link by loading it in a real browser and watching where it ends up.
///
/// Only constructed through [`BrowserResolver::probe`], so holding one means
/// an executable was found at startup.
#[derive(Debug, Clone)]
pub struct BrowserResolver {
    config: BrowserConfig,
    executable: PathBuf,
}

impl BrowserResolver {
    /// Check once whether the browser tier can run in this environment.
    pub fn probe(config: &BrowserConfig) -> Result<Self, BrowserError> {
        if !config.enabled {
            return Err(BrowserError::Disabled);
        }

        let detection = detect::detect_browser(config.chrome_path.as_deref());
        match detection.path {
            Some(executable) if detection.found => {
                info!(path = %executable.display(), "browser tier available");
                Ok(Self {
                    config: config.clone(),
                    executable,
                })
            },
            _ => Err(BrowserError::BrowserNotAvailable(detection.install_hint)),
        }
    }

    /// Path of the browser executable found by the probe.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Load `url` and return the address the browser settles on.
    ///
    /// Never fails: any launch, navigation or CDP error yields `url` itself.
    /// The browser process is torn down before this returns.
    pub async fn resolve_with_browser(&self, url: &str) -> String {
        info!(url, "browser: resolving");

        let session = match BrowserSession::launch(&self.config, &self.executable).await {
            Ok(session) => session,
            Err(e) => {
                warn!(url, error = %e, "browser: launch failed");
                return url.to_string();
            },
        };

        let resolved = match session.new_page().await {
            Ok(page) => self.observe(&page, url).await,
            Err(e) => {
                warn!(url, error = %e, "browser: could not open a tab");
                url.to_string()
            },
        };

        session.close().await;
        resolved
    }

    async fn observe(&self, page: &impl Tab, url: &str) -> String {
        let load_timeout = Duration::from_secs(self.config.page_load_timeout_secs);

        let navigation = match tokio::time::timeout(load_timeout, page.navigate(url)).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Timeout(format!(
                "page load exceeded {}s",
                self.config.page_load_timeout_secs
            ))),
        };

        if let Err(e) = navigation {
            warn!(url, error = %e, "browser: page load error");
            // A redirect may have started before the load gave up.
            if let Ok(current) = self.current_url(page).await
                && !same_url(&current, url)
                && !is_placeholder_url(&current)
            {
                info!(url, partial = %current, "browser: partial redirect observed");
                return current;
            }
        }

        let interval = Duration::from_secs(self.config.poll_interval_secs);
        for attempt in 1..=self.config.poll_attempts {
            tokio::time::sleep(interval).await;
            match self.current_url(page).await {
                Ok(current) if !same_url(&current, url) && !is_placeholder_url(&current) => {
                    info!(url, attempt, resolved = %current, "browser: redirect detected");
                    return current;
                },
                Ok(_) => debug!(url, attempt, "browser: no redirect yet"),
                Err(e) => warn!(url, attempt, error = %e, "browser: could not read current url"),
            }
        }

        match self.current_url(page).await {
            Ok(current) if !is_placeholder_url(&current) => {
                info!(url, final_url = %current, "browser: final url after waiting");
                current
            },
            _ => url.to_string(),
        }
    }

    async fn current_url(&self, page: &impl Tab) -> Result<String, BrowserError> {
        let wait = Duration::from_secs(self.config.element_wait_secs);
        match tokio::time::timeout(wait, page.address()).await {
            Ok(result) => result?
                .ok_or_else(|| BrowserError::Cdp("page reported no url".to_string())),
            Err(_) => Err(BrowserError::Timeout(format!(
                "url lookup exceeded {}s",
                self.config.element_wait_secs
            ))),
        }
    }
}

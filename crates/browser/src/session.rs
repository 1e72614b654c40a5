//! One isolated browser process per lookup.

use std::{path::Path, time::Duration};

use {
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig, Page, handler::viewport::Viewport,
    },
    futures::StreamExt,
    linkrelay_config::BrowserConfig,
    tokio::task::JoinHandle,
    tracing::{debug, warn},
};

use crate::error::BrowserError;

/// Upper bound on the graceful shutdown handshake.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A launched browser and its CDP event pump.
///
/// Call [`BrowserSession::close`] on every path. If the session is dropped
/// without it (early return, panic, task cancellation) the event pump is
/// aborted and `chromiumoxide` kills the child process.
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a fresh headless browser configured from `config`.
    pub async fn launch(config: &BrowserConfig, executable: &Path) -> Result<Self, BrowserError> {
        let mut builder = CdpBrowserConfig::builder()
            .chrome_executable(executable)
            .viewport(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .request_timeout(Duration::from_secs(config.page_load_timeout_secs))
            .arg(format!("--user-agent={}", config.user_agent))
            .arg(format!(
                "--window-size={},{}",
                config.viewport_width, config.viewport_height
            ))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-features=VizDisplayCompositor")
            .arg("--no-sandbox");

        // chromiumoxide is headless unless asked otherwise.
        if !config.headless {
            builder = builder.with_head();
        }
        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let cdp_config = builder.build().map_err(|e| {
            BrowserError::LaunchFailed(format!("failed to build browser config: {e}"))
        })?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
            debug!("browser event handler exited");
        });

        debug!(executable = %executable.display(), "browser session launched");

        Ok(Self {
            browser: Some(browser),
            handler,
        })
    }

    /// Open a blank tab.
    pub async fn new_page(&self) -> Result<Page, BrowserError> {
        let browser = self.browser.as_ref().ok_or_else(|| {
            BrowserError::LaunchFailed("browser session already closed".to_string())
        })?;
        Ok(browser.new_page("about:blank").await?)
    }

    /// Shut the browser down. Failures are logged, never returned.
    pub async fn close(mut self) {
        let Some(mut browser) = self.browser.take() else {
            return;
        };

        match tokio::time::timeout(CLOSE_TIMEOUT, browser.close()).await {
            Ok(Ok(_)) => {},
            Ok(Err(e)) => warn!(error = %e, "browser close failed"),
            Err(_) => warn!("browser close timed out"),
        }

        match tokio::time::timeout(CLOSE_TIMEOUT, browser.wait()).await {
            Ok(Ok(_)) => debug!("browser process exited"),
            Ok(Err(e)) => warn!(error = %e, "waiting for browser process failed"),
            Err(_) => warn!("browser process did not exit in time"),
        }
        // Dropping `browser` kills the child if it is still around.
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if self.browser.is_some() {
            debug!("browser session dropped without close");
        }
    }
}

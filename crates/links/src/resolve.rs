//! Two-tier redirect resolution.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    linkrelay_browser::{BrowserResolver, same_url},
    linkrelay_config::ResolverConfig,
    reqwest::redirect::Policy,
    tracing::{info, warn},
    url::Url,
};

use crate::types::{Resolution, ResolutionMethod};

/// Shortener and click-tracking hosts whose 2xx answers are not trusted.
pub const TRACKING_DOMAINS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "t.co",
    "media.hubspot.com",
    "short.link",
    "goo.gl",
    "ow.ly",
];

/// URLs longer than this (in characters) are treated as tracking links.
pub const TRACKING_URL_MAX_LEN: usize = 200;

const MAX_REDIRECT_HOPS: usize = 10;

/// Whether a plain HTTP answer for `url` should be double-checked in a browser.
pub fn is_tracking_url(url: &str) -> bool {
    if url.chars().count() > TRACKING_URL_MAX_LEN {
        return true;
    }
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    TRACKING_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// `url` as it goes on the wire. Fragments are never sent, so the address
/// reqwest reports back never carries one.
fn without_fragment(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        },
        Err(_) => url.to_string(),
    }
}

/// Something that can find where a link really goes.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Resolution;
}

/// The slow tier: load the URL in a browser. Always returns a URL, the input
/// itself when nothing better was observed.
#[async_trait]
pub trait BrowserFallback: Send + Sync {
    async fn resolve_with_browser(&self, url: &str) -> String;
}

#[async_trait]
impl BrowserFallback for BrowserResolver {
    async fn resolve_with_browser(&self, url: &str) -> String {
        BrowserResolver::resolve_with_browser(self, url).await
    }
}

/// HTTP first, browser when the HTTP answer cannot be trusted.
pub struct RedirectResolver {
    client: reqwest::Client,
    browser: Option<Arc<dyn BrowserFallback>>,
}

impl RedirectResolver {
    /// `browser` is `None` when the startup probe found no usable browser;
    /// resolution then stops after the HTTP tier.
    pub fn new(
        config: &ResolverConfig,
        browser: Option<Arc<dyn BrowserFallback>>,
    ) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::limited(MAX_REDIRECT_HOPS))
            .build()?;
        Ok(Self::with_client(client, browser))
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(client: reqwest::Client, browser: Option<Arc<dyn BrowserFallback>>) -> Self {
        Self { client, browser }
    }

    /// HTTP tier. `Some` when its answer is final, `None` when the browser
    /// should have a look.
    async fn resolve_over_http(&self, url: &str) -> Option<Resolution> {
        info!(url, "http: resolving");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "http: request failed");
                return None;
            },
        };

        let status = response.status();
        let landed = response.url().as_str().to_string();
        drop(response);

        if !same_url(&landed, &without_fragment(url)) {
            info!(url, resolved = %landed, "http: redirect followed");
            return Some(Resolution::new(landed, ResolutionMethod::HttpRedirect));
        }

        if is_tracking_url(url) {
            info!(
                url,
                len = url.chars().count(),
                status = status.as_u16(),
                "http: tracking url, not trusting a redirect-free answer"
            );
            return None;
        }

        if status.is_success() {
            info!(url, status = status.as_u16(), "http: no redirect, url is final");
            return Some(Resolution::new(url, ResolutionMethod::Direct));
        }

        warn!(url, status = status.as_u16(), "http: unsuccessful status");
        None
    }
}

#[async_trait]
impl LinkResolver for RedirectResolver {
    async fn resolve(&self, url: &str) -> Resolution {
        if let Some(resolution) = self.resolve_over_http(url).await {
            return resolution;
        }

        let Some(browser) = &self.browser else {
            warn!(url, "browser tier unavailable, keeping original url");
            return Resolution::new(url, ResolutionMethod::Unresolved);
        };

        let observed = browser.resolve_with_browser(url).await;
        if observed.is_empty() {
            return Resolution::new(url, ResolutionMethod::Unresolved);
        }
        if same_url(&observed, url) {
            warn!(url, "browser: no redirect observed");
            Resolution::new(observed, ResolutionMethod::Unresolved)
        } else {
            Resolution::new(observed, ResolutionMethod::BrowserRedirect)
        }
    }
}

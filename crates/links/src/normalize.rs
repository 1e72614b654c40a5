//! Query and fragment stripping.

use {tracing::warn, url::Url};

/// Drop the query string and fragment from `url`.
///
/// Scheme, host and path are kept exactly as written. Input that does not
/// parse as a URL is returned unchanged.
pub fn normalize(url: &str) -> String {
    if let Err(e) = Url::parse(url) {
        warn!(url, error = %e, "cannot parse url, leaving it as-is");
        return url.to_string();
    }

    // Neither '?' nor '#' may appear unescaped before the query component.
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}

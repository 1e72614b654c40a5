//! Candidate URL lookup in a message.

use std::sync::LazyLock;

use {regex::Regex, tracing::debug, url::Url};

use crate::types::LinkAnnotation;

/// Bare `http(s)://` token, stopping at whitespace or a closing parenthesis.
#[allow(clippy::expect_used)]
pub(crate) static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s)]+").expect("bare url pattern is valid"));

/// Find the link a message is about.
///
/// Explicit link annotations win over inline mentions regardless of their
/// position, and both win over scanning the text. Within a kind the first
/// usable annotation is taken. `None` means the message has no link.
pub fn extract(text: &str, annotations: &[LinkAnnotation]) -> Option<String> {
    let explicit = annotations.iter().find_map(|a| match a {
        LinkAnnotation::ExplicitUrl { url, .. } => with_web_scheme(url),
        LinkAnnotation::InlineUrlMention { .. } => None,
    });
    if let Some(url) = explicit {
        debug!(url, "link from explicit annotation");
        return Some(url);
    }

    let inline = annotations.iter().find_map(|a| match a {
        LinkAnnotation::InlineUrlMention { offset, length } => {
            slice_utf16(text, *offset, *length).and_then(|s| with_web_scheme(&s))
        },
        LinkAnnotation::ExplicitUrl { .. } => None,
    });
    if let Some(url) = inline {
        debug!(url, "link from inline mention");
        return Some(url);
    }

    let scanned = BARE_URL.find(text).map(|m| m.as_str().to_string());
    if let Some(ref url) = scanned {
        debug!(url, "link from text scan");
    }
    scanned
}

/// Cut `length` UTF-16 code units starting at `offset` out of `text`.
fn slice_utf16(text: &str, offset: usize, length: usize) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = offset.checked_add(length)?;
    let slice = units.get(offset..end)?;
    String::from_utf16(slice).ok()
}

/// Accept `http`/`https` URLs verbatim, give scheme-less hosts an `http://`
/// prefix (as Telegram clients do), and reject everything else.
fn with_web_scheme(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.contains("://") {
        let parsed = Url::parse(raw).ok()?;
        return matches!(parsed.scheme(), "http" | "https").then(|| raw.to_string());
    }

    let prefixed = format!("http://{raw}");
    Url::parse(&prefixed).ok().map(|_| prefixed)
}

use std::fmt;

use thiserror::Error;

use crate::tagger::Category;

/// A link marker produced by the transport from a raw message.
///
/// Offsets and lengths are in UTF-16 code units, the unit Telegram uses for
/// message entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAnnotation {
    /// Label text pointing at a separate, already known target.
    ExplicitUrl {
        url: String,
        offset: usize,
        length: usize,
    },
    /// A URL written out in the text itself.
    InlineUrlMention { offset: usize, length: usize },
}

/// How the final URL of a link was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    /// The HTTP answer was trusted as-is.
    Direct,
    /// The HTTP client followed one or more redirects.
    HttpRedirect,
    /// The browser ended up somewhere else.
    BrowserRedirect,
    /// Neither tier could establish a different destination.
    Unresolved,
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::HttpRedirect => "http_redirect",
            Self::BrowserRedirect => "browser_redirect",
            Self::Unresolved => "unresolved",
        })
    }
}

/// Outcome of redirect resolution. `final_url` is never empty; when nothing
/// worked it is the candidate URL itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub final_url: String,
    pub method: ResolutionMethod,
}

impl Resolution {
    pub fn new(final_url: impl Into<String>, method: ResolutionMethod) -> Self {
        Self {
            final_url: final_url.into(),
            method,
        }
    }
}

/// The only outcome of processing that is reported back to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("No link found in message")]
    NoLinkFound,
}

/// A message ready to be posted to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMessage {
    /// Original text with links removed.
    pub display_text: String,
    pub normalized_url: String,
    pub category: Option<Category>,
    /// Channel handle without the leading `@`.
    pub channel_mention: String,
    pub resolution: Resolution,
}

impl ProcessedMessage {
    /// Final post text.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{}\n\n{}\n\n@{}",
            self.display_text, self.normalized_url, self.channel_mention
        );
        if let Some(category) = self.category {
            out.push('\n');
            out.push_str(category.hashtag());
        }
        out
    }
}

impl fmt::Display for ProcessedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

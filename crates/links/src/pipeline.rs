//! Message processing: extract, resolve, normalize, tag, strip, assemble.

use std::sync::{Arc, LazyLock};

use {regex::Regex, tracing::info};

use crate::{
    extract::{BARE_URL, extract},
    normalize::normalize,
    resolve::LinkResolver,
    tagger::tag,
    types::{Failure, LinkAnnotation, ProcessedMessage},
};

/// `[label](target)` markup, keeping the label.
#[allow(clippy::expect_used)]
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\s*\([^)]+\)").expect("markdown link pattern is valid")
});

/// Remove link markup and bare URLs from `text`, then trim.
pub fn strip_links(text: &str) -> String {
    let labels_only = MARKDOWN_LINK.replace_all(text, "$1");
    BARE_URL.replace_all(&labels_only, "").trim().to_string()
}

/// Turns an operator message into a channel post.
pub struct LinkPipeline {
    resolver: Arc<dyn LinkResolver>,
}

impl LinkPipeline {
    pub fn new(resolver: Arc<dyn LinkResolver>) -> Self {
        Self { resolver }
    }

    /// Process one message. The only error is [`Failure::NoLinkFound`];
    /// resolution problems degrade to the best URL known.
    pub async fn process(
        &self,
        text: &str,
        annotations: &[LinkAnnotation],
        channel_mention: &str,
    ) -> Result<ProcessedMessage, Failure> {
        let candidate = extract(text, annotations).ok_or(Failure::NoLinkFound)?;
        info!(url = %candidate, "link found");

        let resolution = self.resolver.resolve(&candidate).await;
        info!(
            url = %candidate,
            final_url = %resolution.final_url,
            method = %resolution.method,
            "link resolved"
        );

        let normalized_url = normalize(&resolution.final_url);
        let category = tag(text);

        Ok(ProcessedMessage {
            display_text: strip_links(text),
            normalized_url,
            category,
            channel_mention: channel_mention.trim_start_matches('@').to_string(),
            resolution,
        })
    }
}

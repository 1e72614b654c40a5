use std::sync::Arc;

use {
    linkrelay_links::{BrowserFallback, LinkPipeline},
    teloxide::{Bot, types::Recipient},
    tokio_util::sync::CancellationToken,
};

/// Everything a handler needs. Updates are processed one at a time by the
/// polling task, so nothing here is behind a lock.
pub struct RelayState {
    pub bot: Bot,
    pub bot_username: Option<String>,
    pub operator_id: u64,
    /// Where processed posts go.
    pub channel: Recipient,
    /// Handle appended to posts, without the `@`.
    pub channel_mention: String,
    pub pipeline: Arc<LinkPipeline>,
    /// `None` when no browser was found at startup.
    pub browser: Option<Arc<dyn BrowserFallback>>,
    /// Cancelled by `/stop`; the binary waits on it.
    pub cancel: CancellationToken,
}

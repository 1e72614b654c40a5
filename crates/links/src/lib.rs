//! Link relay core: find the link in an operator message, follow it to its
//! real destination, strip tracking parameters, tag the content category,
//! and assemble the channel post.
//!
//! Redirects are resolved in two tiers. A plain HTTP GET handles ordinary
//! redirects; known shorteners, very long tracking URLs, failed requests and
//! non-2xx answers fall back to a headless browser (when one was found at
//! startup) because some trackers only forward visitors from page scripts.

pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod resolve;
pub mod tagger;
pub mod types;

pub use {
    extract::extract,
    normalize::normalize,
    pipeline::{LinkPipeline, strip_links},
    resolve::{BrowserFallback, LinkResolver, RedirectResolver, is_tracking_url},
    tagger::{Category, tag},
    types::{Failure, LinkAnnotation, ProcessedMessage, Resolution, ResolutionMethod},
};

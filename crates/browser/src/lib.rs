//! Headless Chrome/Chromium over CDP for observing client-side redirects.
//!
//! A plain HTTP client never runs the page scripts some link shorteners and
//! trackers use to forward visitors. This crate launches an isolated browser
//! per lookup, navigates, and watches the address bar for a bounded time.
//!
//! # Example
//!
//! ```ignore
//! use linkrelay_browser::BrowserResolver;
//!
//! let resolver = BrowserResolver::probe(&config.browser)?;
//! let final_url = resolver.resolve_with_browser("https://bit.ly/xyz").await;
//! ```

pub mod detect;
pub mod error;
pub mod resolver;
pub mod session;

pub use {
    error::BrowserError,
    resolver::{BrowserResolver, is_placeholder_url, same_url},
    session::BrowserSession,
};

//! Telegram transport for the link relay.
//!
//! Long-polls the Bot API, lets only the configured operator through, turns
//! message entities into link annotations for the pipeline, and posts the
//! result silently to the channel.

pub mod access;
pub mod bot;
pub mod error;
pub mod handlers;
pub mod state;

pub use {
    bot::start_polling,
    error::{Error, Result},
    state::RelayState,
};

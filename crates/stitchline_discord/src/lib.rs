//! Stitchline Discord - chat transport
//!
//! Delivers direct messages, slash commands and button presses to the
//! [`stitchline_core::Workshop`] and renders its replies as Discord messages.

pub mod bot;
pub mod error;
pub mod incoming;
pub mod render;

pub use bot::{StitchlineBot, create_client, run_bot};
pub use error::{DiscordError, Result};

// Re-export serenity for convenience
pub use serenity;

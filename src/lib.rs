//! Meme generator service - captions and illustrates a prompt in one PNG
//!
//! A prompt arrives over HTTP or through a Telegram bot, a text model writes a
//! short funny caption for it, an image model paints it, and the two are
//! composited onto a fixed 1024x1024 canvas that is sent back to the caller.

pub mod ai;
pub mod bot;
pub mod cli;
pub mod error;
pub mod image;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};

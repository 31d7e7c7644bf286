//! Green screen detection and perspective-correct screenshot compositing
//!
//! The [`compositing`] module holds the image pipeline; the remaining modules
//! are the CLI, HTTP server and file handling around it.

pub mod cli;
pub mod commands;
pub mod compositing;
pub mod config;
pub mod error;
pub mod imaging;
pub mod server;
pub mod templates;

pub use error::{GreenScreenError, Result};

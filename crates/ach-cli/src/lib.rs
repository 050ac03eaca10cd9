//! Achievement tracker CLI library.
//!
//! This crate provides the CLI interface and the file-backed metadata
//! provider for the achievement tracker.

mod cli;
pub mod commands;
mod config;
pub mod metadata;

pub use cli::{Cli, Commands, GamesAction};
pub use config::Config;
pub use metadata::MetadataDir;

//! CLI subcommand implementations.

pub mod games;
pub mod import;
pub mod locate;
pub mod reset;
pub mod show;
pub mod sync;
pub mod watch;

//! Per-game achievement observers.
//!
//! An [`AchievementObserver`] keeps at most one observer per game. Starting a
//! game resolves its canonical achievement list and unlock files, runs one
//! merge pass over every file that exists, then spawns one watch task per
//! file. Each watch task re-runs the merge pass for its own file whenever the
//! file changes, until the game is stopped.

mod config;
mod error;
mod observer;
mod pass;
mod watcher;

pub use config::WatchConfig;
pub use error::ObserverError;
pub use observer::{AchievementObserver, ImportSummary};
pub use watcher::FileWatcher;

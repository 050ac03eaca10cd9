//! Core domain logic for achievement unlock tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Parsing: reading cracker unlock files into typed records
//! - Adapting: folding unlock records into the canonical achievement list
//! - Locating: discovering unlock files from per-cracker path conventions
//!
//! Persistence and metadata lookup are collaborator traits implemented
//! elsewhere ([`store`], [`metadata`]).

pub mod achievement;
pub mod adapter;
pub mod cracker;
pub mod game;
pub mod ini;
pub mod locate;
pub mod merge;
pub mod metadata;
pub mod parse;
pub mod store;

pub use achievement::{Achievement, AchievementSet};
pub use adapter::extract_unlocks;
pub use cracker::{AchievementFile, Cracker, Encoding, UnknownCracker};
pub use game::{Game, Shop};
pub use locate::{Locator, Roots};
pub use merge::{merge_files, merge_records};
pub use metadata::{MetadataError, MetadataProvider};
pub use parse::{ParseError, UnlockRecord, read_unlock_file};
pub use store::{AchievementStore, GameCatalog, StoreError};

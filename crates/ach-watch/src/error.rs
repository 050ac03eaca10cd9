use std::path::PathBuf;

use ach_core::StoreError;
use thiserror::Error;

/// Observer errors.
///
/// Absence (missing files, metadata or games) and malformed unlock files are
/// not errors; they are logged and skipped. Anything here is an unexpected
/// fault.
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

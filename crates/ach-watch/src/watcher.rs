//! Change notifications for a single file.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::config::WatchConfig;
use crate::error::ObserverError;

/// Notification channel depth. Bursts beyond this are coalesced anyway.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Watches one file for modifications.
///
/// The parent directory is watched rather than the file itself, since
/// crackers often rewrite unlock files by replacing them. A periodic
/// modification-time check backs up the notifications, and is the only
/// signal while the parent directory does not exist yet.
pub struct FileWatcher {
    path: PathBuf,
    rx: mpsc::Receiver<()>,
    poll: Interval,
    last_seen: Option<FileStamp>,
    debounce: time::Duration,
    // Dropping the watcher ends notifications.
    _watcher: Option<RecommendedWatcher>,
}

impl FileWatcher {
    pub fn new(path: &Path, config: &WatchConfig) -> Result<Self, ObserverError> {
        let watch_err = |source| ObserverError::Watch {
            path: path.to_path_buf(),
            source,
        };

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let file_name: Option<OsString> = path.file_name().map(ToOwned::to_owned);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == file_name.as_deref());
                if ours && is_change(event.kind) {
                    // Full channel means a pass is already pending.
                    let _ = tx.try_send(());
                }
            }
            Err(err) => tracing::debug!(error = %err, "file watcher error"),
        })
        .map_err(watch_err)?;

        let watch_dir = path.parent().unwrap_or(path);
        let watcher = if watch_dir.is_dir() {
            watcher
                .watch(watch_dir, RecursiveMode::NonRecursive)
                .map_err(watch_err)?;
            Some(watcher)
        } else {
            tracing::debug!(path = ?path, "parent directory missing, polling only");
            None
        };

        let mut poll = time::interval_at(Instant::now() + config.poll_interval, config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self {
            path: path.to_path_buf(),
            rx,
            poll,
            last_seen: FileStamp::read(path),
            debounce: config.debounce,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits until the file has changed, then lets the burst settle.
    ///
    /// Cancel-safe: dropping the future loses nothing but the wait.
    pub async fn changed(&mut self) {
        loop {
            tokio::select! {
                Some(()) = self.rx.recv() => break,
                _ = self.poll.tick() => {
                    if FileStamp::read(&self.path) != self.last_seen {
                        tracing::debug!(path = ?self.path, "change detected by poll");
                        break;
                    }
                }
            }
        }

        time::sleep(self.debounce).await;
        while self.rx.try_recv().is_ok() {}
        self.last_seen = FileStamp::read(&self.path);
    }
}

fn is_change(kind: EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn fast_config() -> WatchConfig {
        WatchConfig {
            debounce: Duration::from_millis(20),
            poll_interval: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_modification_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("achievements.ini");
        fs::write(&path, "[A]\nAchieved=0\n").unwrap();

        let mut watcher = FileWatcher::new(&path, &fast_config()).unwrap();
        fs::write(&path, "[A]\nAchieved=1\nUnlockTime=1700000000\n").unwrap();

        time::timeout(Duration::from_secs(5), watcher.changed())
            .await
            .expect("change should be observed");
    }

    #[tokio::test]
    async fn test_sibling_files_are_ignored() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("achievements.ini");
        fs::write(&path, "[A]\nAchieved=0\n").unwrap();

        let mut watcher = FileWatcher::new(&path, &fast_config()).unwrap();
        fs::write(temp.path().join("stats.bin"), "x").unwrap();

        let result = time::timeout(Duration::from_millis(300), watcher.changed()).await;
        assert!(result.is_err(), "unrelated file should not trigger a change");
    }

    #[tokio::test]
    async fn test_missing_directory_falls_back_to_polling() {
        let temp = tempfile::tempdir().unwrap();
        let stats = temp.path().join("Stats");
        let path = stats.join("Achievements.ini");

        let mut watcher = FileWatcher::new(&path, &fast_config()).unwrap();
        fs::create_dir_all(&stats).unwrap();
        fs::write(&path, "[A]\nachieved=true\n").unwrap();

        time::timeout(Duration::from_secs(5), watcher.changed())
            .await
            .expect("poll should notice the new file");
    }
}

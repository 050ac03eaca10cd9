use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ach_core::store::{load_achievements, save_achievements};
use ach_core::{
    Achievement, AchievementFile, AchievementSet, AchievementStore, Game, GameCatalog, Locator,
    MetadataProvider, merge_files,
};
use tokio::sync::Mutex as PassLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::WatchConfig;
use crate::error::ObserverError;
use crate::pass::{blocking, log_unlocks, merge_pass};
use crate::watcher::FileWatcher;

/// Registry entry for one observed game.
struct ObserverHandle {
    session: u64,
    token: CancellationToken,
    tasks: JoinSet<()>,
    files: usize,
}

struct Inner {
    metadata: Arc<dyn MetadataProvider>,
    store: Arc<dyn AchievementStore>,
    catalog: Arc<dyn GameCatalog>,
    locator: Locator,
    config: WatchConfig,
    registry: Mutex<HashMap<String, ObserverHandle>>,
    /// One lock per game, held for every read-merge-write of its record.
    pass_locks: Mutex<HashMap<String, Arc<PassLock<()>>>>,
    next_session: AtomicU64,
}

impl Inner {
    fn pass_lock(&self, game_id: &str) -> Arc<PassLock<()>> {
        let mut locks = self
            .pass_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(game_id.to_string()).or_default())
    }

    /// Runs a merge pass with the game's pass lock held, so concurrent
    /// passes for one game never overwrite each other's unlocks.
    async fn locked_pass(
        self: &Arc<Self>,
        game_id: &str,
        fallback: Vec<Achievement>,
        files: Vec<AchievementFile>,
        token: &CancellationToken,
    ) -> Result<AchievementSet, ObserverError> {
        let lock = self.pass_lock(game_id);
        let _guard = lock.lock().await;
        let inner = Arc::clone(self);
        let id = game_id.to_string();
        let token = token.clone();
        blocking(move || merge_pass(inner.store.as_ref(), &id, &fallback, &files, &token)).await?
    }
}

/// Result of importing one game's local unlock files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub game_id: String,
    pub title: String,
    /// Size of the canonical list; zero when no metadata was available.
    pub total: usize,
    pub unlocked: usize,
    pub newly_unlocked: usize,
}

/// Starts, tracks and stops per-game observers.
///
/// Cloning is cheap and every clone shares one registry.
#[derive(Clone)]
pub struct AchievementObserver {
    inner: Arc<Inner>,
}

impl AchievementObserver {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        store: Arc<dyn AchievementStore>,
        catalog: Arc<dyn GameCatalog>,
        locator: Locator,
        config: WatchConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                metadata,
                store,
                catalog,
                locator,
                config,
                registry: Mutex::new(HashMap::new()),
                pass_locks: Mutex::new(HashMap::new()),
                next_session: AtomicU64::new(1),
            }),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, ObserverHandle>> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts observing a game.
    ///
    /// Returns `false` without doing anything if the game is already
    /// registered. A game that is not installed or has no achievement
    /// metadata stays registered with no watch tasks until it is stopped.
    pub async fn start_observing(&self, game_id: &str) -> Result<bool, ObserverError> {
        let (session, token) = {
            let mut registry = self.registry();
            if registry.contains_key(game_id) {
                tracing::debug!(game_id, "already observing");
                return Ok(false);
            }
            let session = self.inner.next_session.fetch_add(1, Ordering::Relaxed);
            let token = CancellationToken::new();
            registry.insert(
                game_id.to_string(),
                ObserverHandle {
                    session,
                    token: token.clone(),
                    tasks: JoinSet::new(),
                    files: 0,
                },
            );
            (session, token)
        };

        match self.prepare(game_id, &token).await {
            Ok(Some((canonical, watched))) => {
                self.attach(game_id, session, canonical, watched);
                Ok(true)
            }
            Ok(None) => Ok(true),
            Err(err) => {
                let mut registry = self.registry();
                if registry.get(game_id).is_some_and(|h| h.session == session) {
                    registry.remove(game_id);
                }
                Err(err)
            }
        }
    }

    /// Resolves the canonical list and the existing unlock files, then runs
    /// the initial pass over all of them.
    async fn prepare(
        &self,
        game_id: &str,
        token: &CancellationToken,
    ) -> Result<Option<(Vec<Achievement>, Vec<(AchievementFile, FileWatcher)>)>, ObserverError> {
        let Some(game) = self.installed_game(game_id).await? else {
            tracing::debug!(game_id, "game not installed, nothing to observe");
            return Ok(None);
        };
        let Some(canonical) = self.canonical_list(&game, token).await? else {
            return Ok(None);
        };

        let files = self.existing_files(game_id).await?;
        if files.is_empty() {
            tracing::debug!(game_id, "no unlock files found");
            return Ok(None);
        }

        // Watch before the initial pass so a write racing it is not missed.
        let mut watched = Vec::with_capacity(files.len());
        for file in &files {
            match FileWatcher::new(&file.path, &self.inner.config) {
                Ok(watcher) => watched.push((file.clone(), watcher)),
                Err(err) => {
                    tracing::error!(game_id, path = ?file.path, error = %err, "failed to watch unlock file");
                }
            }
        }

        let set = self.inner.locked_pass(game_id, canonical, files, token).await?;
        Ok(Some((set.all, watched)))
    }

    /// Spawns one watch task per file, unless the session was stopped while
    /// it was starting.
    fn attach(
        &self,
        game_id: &str,
        session: u64,
        canonical: Vec<Achievement>,
        watched: Vec<(AchievementFile, FileWatcher)>,
    ) {
        let mut registry = self.registry();
        let Some(handle) = registry
            .get_mut(game_id)
            .filter(|h| h.session == session && !h.token.is_cancelled())
        else {
            tracing::debug!(game_id, "stopped while starting");
            return;
        };

        handle.files = watched.len();
        for (file, watcher) in watched {
            handle.tasks.spawn(watch_file(
                Arc::clone(&self.inner),
                game_id.to_string(),
                file,
                watcher,
                canonical.clone(),
                handle.token.child_token(),
            ));
        }
        tracing::info!(game_id, files = handle.files, "observing achievements");
    }

    /// Stops observing a game and waits for its watch tasks to finish.
    ///
    /// A start still in progress is waited for too, up to its pending write,
    /// so nothing from the stopped session is written after this returns.
    /// Returns `false` if the game was not registered.
    pub async fn stop_observing(&self, game_id: &str) -> bool {
        let handle = {
            let mut registry = self.registry();
            let handle = registry.remove(game_id);
            if let Some(handle) = &handle {
                handle.token.cancel();
            }
            handle
        };
        let Some(mut handle) = handle else {
            return false;
        };

        drain(game_id, &mut handle.tasks).await;
        self.settle(game_id).await;
        tracing::info!(game_id, "stopped observing");
        true
    }

    /// Stops every observed game. Returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let handles: Vec<(String, ObserverHandle)> = {
            let mut registry = self.registry();
            let handles: Vec<_> = registry.drain().collect();
            for (_, handle) in &handles {
                handle.token.cancel();
            }
            handles
        };

        let stopped = handles.len();
        for (game_id, mut handle) in handles {
            drain(&game_id, &mut handle.tasks).await;
            self.settle(&game_id).await;
        }
        tracing::info!(games = stopped, "stopped all observers");
        stopped
    }

    /// Waits out any pass holding the game's lock. Once cancelled, later
    /// holders see the token and skip their write.
    async fn settle(&self, game_id: &str) {
        let lock = self.inner.pass_lock(game_id);
        drop(lock.lock().await);
    }

    /// Starts observing every installed game. Returns how many were started.
    ///
    /// A failure to start one game is logged and does not stop the others.
    pub async fn watch_all_installed_games(&self) -> Result<usize, ObserverError> {
        let catalog = Arc::clone(&self.inner.catalog);
        let games = blocking(move || catalog.installed_games()).await??;

        let mut started = 0;
        for game in games {
            match self.start_observing(&game.object_id).await {
                Ok(true) => started += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(game_id = %game.object_id, error = %err, "failed to start observer");
                }
            }
        }
        Ok(started)
    }

    /// Ids of every registered game, sorted.
    pub fn active_games(&self) -> Vec<String> {
        let mut games: Vec<String> = self.registry().keys().cloned().collect();
        games.sort();
        games
    }

    pub fn is_watching(&self, game_id: &str) -> bool {
        self.registry().contains_key(game_id)
    }

    /// Number of files watched for a registered game.
    pub fn watched_file_count(&self, game_id: &str) -> Option<usize> {
        self.registry().get(game_id).map(|h| h.files)
    }

    /// Runs one merge pass for a game without watching it.
    ///
    /// Returns `None` if the game is not installed or has no metadata.
    pub async fn sync_game(&self, game_id: &str) -> Result<Option<AchievementSet>, ObserverError> {
        let token = CancellationToken::new();
        let Some(game) = self.installed_game(game_id).await? else {
            return Ok(None);
        };
        let Some(canonical) = self.canonical_list(&game, &token).await? else {
            return Ok(None);
        };
        let files = self.existing_files(game_id).await?;

        let set = self.inner.locked_pass(game_id, canonical, files, &token).await?;
        Ok(Some(set))
    }

    /// Imports unlock files for every installed game that has none stored.
    ///
    /// Games without metadata get an empty list stored so they are skipped
    /// next time.
    pub async fn import_local(&self) -> Result<Vec<ImportSummary>, ObserverError> {
        let inner = Arc::clone(&self.inner);
        let located = blocking(move || inner.locator.locate_all(None)).await?;
        let catalog = Arc::clone(&self.inner.catalog);
        let games = blocking(move || catalog.installed_games()).await??;

        let mut summaries = Vec::new();
        for game in games {
            let Some(files) = located.get(&game.object_id) else {
                continue;
            };
            let files: Vec<AchievementFile> = files.iter().filter(|f| f.exists()).cloned().collect();
            if files.is_empty() {
                continue;
            }

            if self.has_record(&game.object_id).await? {
                tracing::debug!(game_id = %game.object_id, "already imported");
                continue;
            }

            let canonical = self.fetch_metadata(&game).await.unwrap_or_default();
            let lock = self.inner.pass_lock(&game.object_id);
            let guard = lock.lock().await;
            // An observer may have stored a list while metadata was fetched.
            if self.has_record(&game.object_id).await? {
                continue;
            }
            let store = Arc::clone(&self.inner.store);
            let id = game.object_id.clone();
            let set = blocking(move || -> Result<AchievementSet, ObserverError> {
                let set = merge_files(&canonical, &files);
                save_achievements(store.as_ref(), &id, &set.all)?;
                log_unlocks(&id, &set.newly_unlocked);
                Ok(set)
            })
            .await??;
            drop(guard);

            tracing::info!(
                game_id = %game.object_id,
                unlocked = set.unlocked_count(),
                total = set.all.len(),
                "imported local achievements"
            );
            summaries.push(ImportSummary {
                game_id: game.object_id,
                title: game.title,
                total: set.all.len(),
                unlocked: set.unlocked_count(),
                newly_unlocked: set.newly_unlocked.len(),
            });
        }
        Ok(summaries)
    }

    async fn has_record(&self, game_id: &str) -> Result<bool, ObserverError> {
        let store = Arc::clone(&self.inner.store);
        let id = game_id.to_string();
        Ok(blocking(move || store.get_achievement_record(&id)).await??.is_some())
    }

    async fn installed_game(&self, game_id: &str) -> Result<Option<Game>, ObserverError> {
        let catalog = Arc::clone(&self.inner.catalog);
        let id = game_id.to_string();
        Ok(blocking(move || catalog.installed_game(&id)).await??)
    }

    async fn existing_files(&self, game_id: &str) -> Result<Vec<AchievementFile>, ObserverError> {
        let inner = Arc::clone(&self.inner);
        let id = game_id.to_string();
        blocking(move || {
            inner
                .locator
                .locate_game(&id)
                .into_iter()
                .filter(AchievementFile::exists)
                .collect::<Vec<_>>()
        })
        .await
    }

    /// Stored list if one exists, otherwise fresh metadata, which is then
    /// stored as the game's list.
    async fn canonical_list(
        &self,
        game: &Game,
        token: &CancellationToken,
    ) -> Result<Option<Vec<Achievement>>, ObserverError> {
        let store = Arc::clone(&self.inner.store);
        let id = game.object_id.clone();
        let stored = blocking(move || load_achievements(store.as_ref(), &id)).await??;
        if let Some(list) = stored.filter(|l| !l.is_empty()) {
            return Ok(Some(list));
        }

        let Some(list) = self.fetch_metadata(game).await else {
            return Ok(None);
        };

        let lock = self.inner.pass_lock(&game.object_id);
        let _guard = lock.lock().await;
        if !token.is_cancelled() {
            let store = Arc::clone(&self.inner.store);
            let id = game.object_id.clone();
            let cached = list.clone();
            blocking(move || -> Result<(), ObserverError> {
                // A pass may have stored unlocks since the first read.
                if load_achievements(store.as_ref(), &id)?.is_some_and(|l| !l.is_empty()) {
                    return Ok(());
                }
                save_achievements(store.as_ref(), &id, &cached)?;
                Ok(())
            })
            .await??;
        }
        Ok(Some(list))
    }

    async fn fetch_metadata(&self, game: &Game) -> Option<Vec<Achievement>> {
        match self
            .inner
            .metadata
            .canonical_achievements(game.shop, &game.object_id)
            .await
        {
            Ok(Some(list)) => Some(list),
            Ok(None) => {
                tracing::debug!(game_id = %game.object_id, shop = %game.shop, "no achievement metadata");
                None
            }
            Err(err) => {
                tracing::warn!(game_id = %game.object_id, error = %err, "failed to fetch achievement metadata");
                None
            }
        }
    }
}

async fn drain(game_id: &str, tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Err(err) if err.is_panic() => {
                tracing::error!(game_id, error = %err, "watch task panicked");
            }
            _ => {}
        }
    }
}

async fn watch_file(
    inner: Arc<Inner>,
    game_id: String,
    file: AchievementFile,
    watcher: FileWatcher,
    canonical: Vec<Achievement>,
    token: CancellationToken,
) {
    if let Err(err) = run_watch(&inner, &game_id, &file, watcher, canonical, &token).await {
        tracing::error!(game_id = %game_id, path = ?file.path, error = %err, "watch task failed");
    }
}

async fn run_watch(
    inner: &Arc<Inner>,
    game_id: &str,
    file: &AchievementFile,
    mut watcher: FileWatcher,
    canonical: Vec<Achievement>,
    token: &CancellationToken,
) -> Result<(), ObserverError> {
    let mut last = canonical;

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                tracing::debug!(game_id, path = ?file.path, "watch task cancelled");
                return Ok(());
            }
            () = watcher.changed() => {}
        }

        tracing::debug!(game_id, path = ?file.path, "unlock file changed");
        let set = inner
            .locked_pass(game_id, last, vec![file.clone()], token)
            .await?;
        last = set.all;
    }
}

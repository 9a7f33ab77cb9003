//! The orchestrator: owns the session registry, the shuffle queue, and the
//! two maintenance loops.
//!
//! Sessions live in an explicit id → session map with create/close
//! lifecycle. Each session sits behind its own mutex, which serializes all
//! operations touching that driver handle; the maintenance loops use
//! `try_lock`, so a session busy with a user action is simply skipped for
//! one interval (the ticks are idempotent). One session failing or
//! blocking never affects ticking of the others.

use crate::queue::ShuffleQueue;
use crate::session::PlaybackSession;
use crate::store::{self, SessionRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tubepilot_core::{Error, Result};
use tubepilot_driver::{DriverFactory, LaunchOptions};
use uuid::Uuid;

/// Orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Ad-skip sweep interval in milliseconds. Ads appear and disappear
    /// within seconds, so this runs fast.
    pub ad_tick_ms: u64,

    /// Error-recovery sweep interval in milliseconds. Each session also
    /// throttles itself to at most one check per second.
    pub recovery_tick_ms: u64,

    /// Whether newly created sessions skip ads.
    pub default_ad_skip: bool,

    /// Base directory for persistent browser profiles.
    pub profile_base: PathBuf,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ad_tick_ms: 800,
            recovery_tick_ms: 1000,
            default_ad_skip: true,
            profile_base: PathBuf::from("profiles"),
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ad_tick_ms(mut self, ms: u64) -> Self {
        self.ad_tick_ms = ms;
        self
    }

    pub fn recovery_tick_ms(mut self, ms: u64) -> Self {
        self.recovery_tick_ms = ms;
        self
    }

    pub fn default_ad_skip(mut self, enabled: bool) -> Self {
        self.default_ad_skip = enabled;
        self
    }

    pub fn profile_base(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_base = dir.into();
        self
    }
}

/// Snapshot of the playback progress display: current title plus the
/// queue's 1-based position and round length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub title: String,
    pub position: usize,
    pub total: usize,
}

type SessionSlot = Arc<Mutex<PlaybackSession>>;

struct Inner {
    config: OrchestratorConfig,
    factory: Arc<dyn DriverFactory>,
    sessions: RwLock<HashMap<String, SessionSlot>>,
    queue: Mutex<ShuffleQueue>,
    /// Most recently opened session, for the progress display.
    active: Mutex<Option<String>>,
}

/// Owns the set of concurrent playback sessions and mediates user intents
/// and maintenance ticks. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(factory: Arc<dyn DriverFactory>, config: OrchestratorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                factory,
                sessions: RwLock::new(HashMap::new()),
                queue: Mutex::new(ShuffleQueue::new()),
                active: Mutex::new(None),
            }),
        }
    }

    /// Create a cold session slot from a record and return its id. A blank
    /// profile name gets a generated one so the browser profile persists
    /// across runs.
    pub async fn create_session(&self, mut record: SessionRecord) -> String {
        if record.profile.trim().is_empty() {
            record.profile = format!("profile-{}", short_id());
        }
        let id = Uuid::new_v4().to_string();
        let row = self.inner.queue.lock().await.push(record.url.clone());
        let launch = self.resolve_launch(&record);
        let session = PlaybackSession::new(
            &id,
            row,
            record,
            launch,
            self.inner.config.default_ad_skip,
            self.inner.factory.clone(),
        );
        self.inner.sessions.write().await.insert(id.clone(), Arc::new(Mutex::new(session)));
        tracing::info!(session = %id, row, "session created");
        id
    }

    pub async fn session_count(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    /// Session ids in row order.
    pub async fn session_ids(&self) -> Vec<String> {
        let sessions = self.inner.sessions.read().await;
        let mut rows = Vec::with_capacity(sessions.len());
        for (id, slot) in sessions.iter() {
            rows.push((slot.lock().await.row(), id.clone()));
        }
        rows.sort_by_key(|(row, _)| *row);
        rows.into_iter().map(|(_, id)| id).collect()
    }

    /// Open a URL in the targeted session. `launch` overrides the
    /// session's stored proxy/profile options; passing `None` keeps them.
    pub async fn open(&self, id: &str, url: &str, launch: Option<LaunchOptions>) -> Result<()> {
        let slot = self.get(id).await?;
        let row;
        let url_changed;
        {
            let mut session = slot.lock().await;
            let launch = launch.unwrap_or_else(|| session.launch().clone());
            url_changed = session.current_url() != url;
            session.open(url, launch).await?;
            row = session.row();
        }

        let mut queue = self.inner.queue.lock().await;
        if url_changed {
            queue.set_url(row, url);
        }
        queue.align_to(row);
        drop(queue);

        *self.inner.active.lock().await = Some(id.to_string());
        Ok(())
    }

    /// Toggle play/pause on the targeted session; returns the resulting
    /// "now playing" flag for display.
    pub async fn toggle_play_pause(&self, id: &str) -> Result<bool> {
        let slot = self.get(id).await?;
        let session = slot.lock().await;
        Ok(session.toggle_play_pause().await)
    }

    pub async fn play(&self, id: &str) -> Result<()> {
        let slot = self.get(id).await?;
        slot.lock().await.play().await;
        Ok(())
    }

    pub async fn pause(&self, id: &str) -> Result<()> {
        let slot = self.get(id).await?;
        slot.lock().await.pause().await;
        Ok(())
    }

    pub async fn set_ad_skip(&self, id: &str, enabled: bool) -> Result<()> {
        let slot = self.get(id).await?;
        slot.lock().await.set_ad_skip(enabled);
        Ok(())
    }

    /// Advance the targeted session: open the shuffle queue's next URL in
    /// it, or fall back to the in-page next control when the queue has no
    /// eligible items. A cold session with an empty queue has nothing to
    /// advance to.
    pub async fn next(&self, id: &str) -> Result<()> {
        let slot = self.get(id).await?;
        let advanced = self.inner.queue.lock().await.advance();

        match advanced {
            Some((_, url)) => {
                {
                    let mut session = slot.lock().await;
                    let launch = session.launch().clone();
                    session.open(&url, launch).await?;
                }
                *self.inner.active.lock().await = Some(id.to_string());
                Ok(())
            }
            None => {
                let session = slot.lock().await;
                if session.is_live() {
                    session.click_next().await;
                    Ok(())
                } else {
                    Err(Error::EmptyQueue)
                }
            }
        }
    }

    /// Close the targeted session: remove it from the registry (no future
    /// tick will touch it) and tear down its driver handle.
    pub async fn close(&self, id: &str) -> Result<()> {
        let slot = self
            .inner
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| Error::UnknownSession(id.to_string()))?;

        {
            let mut active = self.inner.active.lock().await;
            if active.as_deref() == Some(id) {
                *active = None;
            }
        }

        slot.lock().await.close().await;
        Ok(())
    }

    /// Close every session.
    pub async fn shutdown(&self) {
        let ids: Vec<String> =
            self.inner.sessions.read().await.keys().cloned().collect();
        for id in ids {
            if let Err(e) = self.close(&id).await {
                tracing::debug!(session = %id, error = %e, "close during shutdown");
            }
        }
    }

    /// Add playable URLs as cold session slots. Blank lines and `#`
    /// comments are skipped; returns the number added.
    pub async fn import_urls<I>(&self, lines: I) -> usize
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut added = 0;
        for line in lines {
            let url = line.as_ref().trim();
            if url.is_empty() || url.starts_with('#') {
                continue;
            }
            self.create_session(SessionRecord::with_url(url)).await;
            added += 1;
        }
        added
    }

    /// Open up to `limit` cold sessions on their recorded URLs, in row
    /// order. Returns the number successfully opened; failures are
    /// reported per session and do not stop the sweep.
    pub async fn open_pending(&self, limit: usize) -> usize {
        let mut pending: Vec<(usize, String, SessionSlot)> = Vec::new();
        {
            let sessions = self.inner.sessions.read().await;
            for (id, slot) in sessions.iter() {
                let session = slot.lock().await;
                if !session.is_live() && !session.current_url().trim().is_empty() {
                    pending.push((session.row(), id.clone(), slot.clone()));
                }
            }
        }
        pending.sort_by_key(|(row, ..)| *row);

        let mut opened = 0;
        for (row, id, slot) in pending.into_iter().take(limit) {
            let result = {
                let mut session = slot.lock().await;
                let url = session.current_url().to_string();
                let launch = session.launch().clone();
                session.open(&url, launch).await
            };
            match result {
                Ok(()) => {
                    self.inner.queue.lock().await.align_to(row);
                    *self.inner.active.lock().await = Some(id);
                    opened += 1;
                }
                Err(e) => tracing::warn!(session = %id, error = %e, "open failed"),
            }
        }
        opened
    }

    /// Title of the most recently opened session plus the queue progress.
    /// Display-only: a busy session reports a placeholder title rather
    /// than blocking.
    pub async fn current_progress(&self) -> Progress {
        let (position, total) = self.inner.queue.lock().await.progress();

        let active = self.inner.active.lock().await.clone();
        let title = match active {
            Some(id) => match self.get(&id).await {
                Ok(slot) => match slot.try_lock() {
                    Ok(session) => session.title().await.unwrap_or_else(|| "-".to_string()),
                    Err(_) => "-".to_string(),
                },
                Err(_) => "-".to_string(),
            },
            None => "-".to_string(),
        };

        Progress { title, position, total }
    }

    /// Persist all session records (row order) to a JSON file.
    pub async fn save_sessions(&self, path: &Path) -> Result<usize> {
        let mut rows = Vec::new();
        {
            let sessions = self.inner.sessions.read().await;
            for slot in sessions.values() {
                let session = slot.lock().await;
                rows.push((session.row(), session.record().clone()));
            }
        }
        rows.sort_by_key(|(row, _)| *row);
        let records: Vec<SessionRecord> = rows.into_iter().map(|(_, r)| r).collect();
        store::save_records(path, &records)?;
        Ok(records.len())
    }

    /// Load session records from a JSON file into cold slots. Returns the
    /// number added.
    pub async fn load_sessions(&self, path: &Path) -> Result<usize> {
        let records = store::load_records(path)?;
        let count = records.len();
        for record in records {
            self.create_session(record).await;
        }
        Ok(count)
    }

    /// Start the two maintenance loops. Dropping (or `stop`ping) the guard
    /// aborts them; sessions themselves are unaffected.
    pub fn spawn_maintenance(&self) -> MaintenanceGuard {
        let ad = {
            let orch = self.clone();
            tokio::spawn(async move { orch.ad_skip_loop().await })
        };
        let recovery = {
            let orch = self.clone();
            tokio::spawn(async move { orch.recovery_loop().await })
        };
        MaintenanceGuard { tasks: vec![ad, recovery] }
    }

    async fn ad_skip_loop(&self) {
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.inner.config.ad_tick_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for slot in self.slots().await {
                let Ok(session) = slot.try_lock() else { continue };
                session.tick_ad_skip().await;
            }
        }
    }

    async fn recovery_loop(&self) {
        let mut ticker = tokio::time::interval(Duration::from_millis(
            self.inner.config.recovery_tick_ms.max(1),
        ));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for slot in self.slots().await {
                let Ok(mut session) = slot.try_lock() else { continue };
                session.tick_error_recovery(Instant::now()).await;
            }
        }
    }

    async fn slots(&self) -> Vec<SessionSlot> {
        self.inner.sessions.read().await.values().cloned().collect()
    }

    async fn get(&self, id: &str) -> Result<SessionSlot> {
        self.inner
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownSession(id.to_string()))
    }

    fn resolve_launch(&self, record: &SessionRecord) -> LaunchOptions {
        let mut launch = LaunchOptions::new();
        let proxy = record.proxy.trim();
        if !proxy.is_empty() {
            launch = launch.proxy(proxy);
        }
        let safe = store::sanitize_profile_name(record.profile.trim());
        if !safe.is_empty() {
            launch = launch.profile_dir(self.inner.config.profile_base.join(safe));
        }
        launch
    }
}

/// Abort guard for the maintenance loops.
pub struct MaintenanceGuard {
    tasks: Vec<JoinHandle<()>>,
}

impl MaintenanceGuard {
    /// Stop both loops now.
    pub fn stop(mut self) {
        self.abort_all();
    }

    fn abort_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for MaintenanceGuard {
    fn drop(&mut self) {
        self.abort_all();
    }
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

//! One independently controlled playback session.
//!
//! A session owns at most one driver handle, created lazily on the first
//! `open`. With no handle the session is cold: every maintenance tick and
//! playback action is a no-op. Play/pause state is never tracked locally;
//! it is queried from the page whenever it matters, because the page
//! changes underneath us.
//!
//! Driver failures here are expected, frequent races against an
//! autonomously changing document. They are absorbed at this boundary
//! (logged at debug level) and never reach the maintenance loop or other
//! sessions; only `open` propagates its error, since the caller reports it
//! to the user.

use crate::recovery::{RecoveryState, Snapshot};
use crate::scripts;
use crate::store::SessionRecord;
use std::sync::Arc;
use std::time::Instant;
use tubepilot_core::{Error, Result};
use tubepilot_driver::{DriverFactory, LaunchOptions, PageDriver};

pub struct PlaybackSession {
    id: String,
    row: usize,
    record: SessionRecord,
    launch: LaunchOptions,
    ad_skip: bool,
    driver: Option<Arc<dyn PageDriver>>,
    factory: Arc<dyn DriverFactory>,
    recovery: RecoveryState,
}

impl PlaybackSession {
    pub fn new(
        id: impl Into<String>,
        row: usize,
        record: SessionRecord,
        launch: LaunchOptions,
        ad_skip: bool,
        factory: Arc<dyn DriverFactory>,
    ) -> Self {
        Self {
            id: id.into(),
            row,
            record,
            launch,
            ad_skip,
            driver: None,
            factory,
            recovery: RecoveryState::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The session's slot in the shared URL list.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn launch(&self) -> &LaunchOptions {
        &self.launch
    }

    pub fn current_url(&self) -> &str {
        &self.record.url
    }

    pub fn ad_skip(&self) -> bool {
        self.ad_skip
    }

    pub fn set_ad_skip(&mut self, enabled: bool) {
        self.ad_skip = enabled;
    }

    /// A session with a driver handle; cold otherwise.
    pub fn is_live(&self) -> bool {
        self.driver.is_some()
    }

    /// Open a URL, creating the driver handle on first use. When the
    /// session is already live and the launch options differ, the handle
    /// is torn down and relaunched first (proxy and profile are bind-time
    /// browser parameters). Resets the recovery state on success.
    pub async fn open(&mut self, url: &str, launch: LaunchOptions) -> Result<()> {
        let driver = match self.driver {
            Some(ref d) => d.clone(),
            None => {
                let d = self.factory.create();
                self.driver = Some(d.clone());
                d
            }
        };

        match driver.start(&launch).await {
            Ok(()) => {}
            Err(Error::ConfigurationChanged) => {
                tracing::info!(session = %self.id, "launch options changed; relaunching browser");
                driver.stop().await?;
                driver.start(&launch).await?;
            }
            Err(e) => return Err(e),
        }

        driver.navigate(url).await?;

        self.record.url = url.to_string();
        self.launch = launch;
        self.recovery.reset();
        tracing::info!(session = %self.id, url, "session opened");
        Ok(())
    }

    /// Query the real play state and issue the opposite action. Returns the
    /// resulting "now playing" flag, for display only; cold sessions and
    /// pages without a media element yield `false`.
    pub async fn toggle_play_pause(&self) -> bool {
        let Some(driver) = self.driver.as_ref() else {
            return false;
        };
        match driver.eval_script(scripts::TOGGLE_PLAY_PAUSE).await {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => {
                tracing::debug!(session = %self.id, error = %e, "toggle skipped");
                false
            }
        }
    }

    pub async fn play(&self) {
        self.run_best_effort(scripts::PLAY).await;
    }

    pub async fn pause(&self) {
        self.run_best_effort(scripts::PAUSE).await;
    }

    /// Click the in-page next control (the single-session advance policy;
    /// queue-driven advance lives in the orchestrator).
    pub async fn click_next(&self) {
        self.run_best_effort(scripts::CLICK_NEXT).await;
    }

    pub async fn is_playing(&self) -> bool {
        let Some(driver) = self.driver.as_ref() else {
            return false;
        };
        match driver.eval_script(scripts::IS_PLAYING).await {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Best-effort page title for display.
    pub async fn title(&self) -> Option<String> {
        let driver = self.driver.as_ref()?;
        driver.title().await.ok().filter(|t| !t.trim().is_empty())
    }

    /// Tear down the driver handle and return to cold. Safe from any state;
    /// a failing quit still leaves the session cold.
    pub async fn close(&mut self) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.stop().await {
                tracing::warn!(session = %self.id, error = %e, "browser quit failed");
            }
        }
        self.recovery.reset();
        tracing::info!(session = %self.id, "session closed");
    }

    /// One ad-skip sweep. No-op when cold or when ad-skip is disabled for
    /// this session; otherwise idempotent and safe every tick.
    pub async fn tick_ad_skip(&self) {
        if !self.ad_skip {
            return;
        }
        self.run_best_effort(scripts::AD_SKIP_SWEEP).await;
    }

    /// One error-recovery check: read a fresh playback snapshot and reload
    /// the page when the decision rule says so. Internally throttled to at
    /// most one check per second.
    pub async fn tick_error_recovery(&mut self, now: Instant) {
        let Some(driver) = self.driver.clone() else {
            return;
        };
        if !self.recovery.should_check(now) {
            return;
        }

        let value = match driver.eval_script(scripts::PLAYBACK_SNAPSHOT).await {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(session = %self.id, error = %e, "snapshot read skipped");
                return;
            }
        };
        let Some(snapshot) = Snapshot::from_value(value) else {
            return;
        };

        if self.recovery.should_reload(now, &snapshot) {
            tracing::warn!(
                session = %self.id,
                url = %self.record.url,
                error_overlay = snapshot.error_overlay,
                "playback broken; reloading"
            );
            if let Err(e) = driver.refresh().await {
                tracing::debug!(session = %self.id, error = %e, "reload failed");
            }
            self.recovery.note_reload(now);
        }
    }

    async fn run_best_effort(&self, script: &str) {
        let Some(driver) = self.driver.as_ref() else {
            return;
        };
        if let Err(e) = driver.run_script(script).await {
            tracing::debug!(session = %self.id, error = %e, "script skipped");
        }
    }
}

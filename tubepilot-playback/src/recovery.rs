//! Stall and error detection with backoff-gated reloads.
//!
//! The error-recovery tick reads a fresh [`Snapshot`] from the page every
//! time; [`RecoveryState`] keeps only what has to survive between ticks (the
//! last observed media time, the reload timestamps, and the current backoff).
//! Reloading a healthy session is far more disruptive than a missed check,
//! so a warranted reload still waits out the backoff window, which doubles
//! after every reload and relaxes only once playback demonstrably moves
//! again.

use serde::Deserialize;
use std::time::{Duration, Instant};

/// Minimum spacing between snapshot reads for one session.
pub const CHECK_THROTTLE: Duration = Duration::from_secs(1);

/// Reload spacing floor and ceiling.
pub const BACKOFF_FLOOR: Duration = Duration::from_secs(10);
pub const BACKOFF_CEILING: Duration = Duration::from_secs(300);

/// Media-time delta below which playback is not considered to have moved.
const PROGRESS_EPSILON: f64 = 0.01;

/// No forward progress for this long while unpaused and buffered counts as
/// stuck.
const STALL_WINDOW: Duration = Duration::from_secs(20);

/// Forward progress observed this long after a reload relaxes the backoff
/// back to its floor.
const RELAX_WINDOW: Duration = Duration::from_secs(15);

/// HTMLMediaElement.readyState at or above which enough data is buffered
/// that a frozen currentTime means a stall rather than a slow network.
const READY_CURRENT_DATA: i64 = 2;

/// Ephemeral per-tick view of the player, parsed from the snapshot script's
/// JSON result. Fields are optional because the media element may not exist
/// yet (mid-navigation, consent walls, error pages).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub error_overlay: bool,
    #[serde(default)]
    pub media_time: Option<f64>,
    #[serde(default)]
    pub paused: Option<bool>,
    #[serde(default)]
    pub ready_state: i64,
}

impl Snapshot {
    /// Parse the snapshot script's result. `None` when the page returned
    /// something unusable (e.g. null during navigation).
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

/// Per-session recovery bookkeeping. Reset on every successful `open`.
#[derive(Debug, Clone)]
pub struct RecoveryState {
    last_check: Option<Instant>,
    last_reload: Option<Instant>,
    last_media_time: Option<f64>,
    last_progress_at: Option<Instant>,
    backoff: Duration,
}

impl Default for RecoveryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryState {
    pub fn new() -> Self {
        Self {
            last_check: None,
            last_reload: None,
            last_media_time: None,
            last_progress_at: None,
            backoff: BACKOFF_FLOOR,
        }
    }

    /// Forget everything; called when a session (re)opens a URL.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Current reload spacing, mostly for tests and display.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Rate-limits snapshot reads to once per [`CHECK_THROTTLE`].
    pub fn should_check(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_check {
            if now.duration_since(last) < CHECK_THROTTLE {
                return false;
            }
        }
        self.last_check = Some(now);
        true
    }

    /// Apply the decision rule to a fresh snapshot. Returns `true` when a
    /// reload is both warranted and allowed by the backoff gate; the caller
    /// issues the refresh and then calls [`RecoveryState::note_reload`].
    pub fn should_reload(&mut self, now: Instant, snapshot: &Snapshot) -> bool {
        let warranted = if snapshot.error_overlay {
            true
        } else if let Some(t) = snapshot.media_time {
            if self.observe_media_time(now, t) {
                false
            } else {
                self.is_stuck(now, snapshot)
            }
        } else {
            // No media element to judge yet.
            false
        };

        warranted && self.reload_allowed(now)
    }

    /// Record a reload that was just issued: stamp it, double the backoff,
    /// and drop the media observations (the page restarts from scratch).
    pub fn note_reload(&mut self, now: Instant) {
        self.last_reload = Some(now);
        self.backoff = (self.backoff * 2).min(BACKOFF_CEILING);
        self.last_media_time = None;
        self.last_progress_at = None;
    }

    /// Track the media clock. Returns `true` when playback moved forward.
    fn observe_media_time(&mut self, now: Instant, t: f64) -> bool {
        match self.last_media_time {
            None => {
                // First observation since open/reload: baseline only.
                self.last_media_time = Some(t);
                self.last_progress_at = Some(now);
                false
            }
            Some(prev) if t - prev > PROGRESS_EPSILON => {
                self.last_media_time = Some(t);
                self.last_progress_at = Some(now);
                let past_reload = match self.last_reload {
                    Some(r) => now.duration_since(r) > RELAX_WINDOW,
                    None => true,
                };
                if past_reload {
                    self.backoff = BACKOFF_FLOOR;
                }
                true
            }
            Some(prev) if prev - t > PROGRESS_EPSILON => {
                // The clock went backwards (seek or restarted element);
                // re-baseline instead of treating it as a stall.
                self.last_media_time = Some(t);
                self.last_progress_at = Some(now);
                false
            }
            Some(_) => false,
        }
    }

    fn is_stuck(&self, now: Instant, snapshot: &Snapshot) -> bool {
        if snapshot.paused.unwrap_or(true) {
            return false;
        }
        if snapshot.ready_state < READY_CURRENT_DATA {
            return false;
        }
        match self.last_progress_at {
            Some(at) => now.duration_since(at) > STALL_WINDOW,
            None => false,
        }
    }

    fn reload_allowed(&self, now: Instant) -> bool {
        match self.last_reload {
            Some(last) => now.duration_since(last) >= self.backoff,
            None => true,
        }
    }
}

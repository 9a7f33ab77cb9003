//! Page-side scripts issued against the player.
//!
//! Everything here is best-effort: the page changes autonomously, so each
//! script re-queries its elements and tolerates their absence.

/// Reads the ephemeral playback snapshot used by the error-recovery tick.
pub const PLAYBACK_SNAPSHOT: &str = r#"
var v = document.querySelector('video');
var err = document.querySelector('.ytp-error, ytd-player-error-message-renderer');
return {
    error_overlay: !!err,
    media_time: v ? v.currentTime : null,
    paused: v ? v.paused : null,
    ready_state: v ? v.readyState : 0
};
"#;

/// One ad-skip sweep. Safe to run every tick regardless of page state:
/// dismisses the overlay close control, clicks the skip control, and while
/// an ad is showing mutes the media element and fast-forwards it; restores
/// normal playback speed once the ad is gone.
pub const AD_SKIP_SWEEP: &str = r#"
var close = document.querySelector('.ytp-ad-overlay-close-button');
if (close) { close.click(); }
var skip = document.querySelector('.ytp-ad-skip-button, .ytp-ad-skip-button-modern, .ytp-skip-ad-button');
if (skip) { skip.click(); }
var v = document.querySelector('video');
if (!v) { return; }
var player = document.querySelector('.html5-video-player');
if (player && player.classList.contains('ad-showing')) {
    v.muted = true;
    if (v.playbackRate !== 16) { v.playbackRate = 16; }
} else if (v.playbackRate > 1.1) {
    v.playbackRate = 1.0;
}
"#;

/// Queries the real play state and issues the opposite action. Returns the
/// resulting "now playing" flag, or null when there is no media element.
pub const TOGGLE_PLAY_PAUSE: &str = r#"
var v = document.querySelector('video');
if (!v) { return null; }
if (v.paused) { v.play(); return true; }
v.pause();
return false;
"#;

pub const PLAY: &str =
    "var v = document.querySelector('video'); if (v) { v.play(); }";

pub const PAUSE: &str =
    "var v = document.querySelector('video'); if (v) { v.pause(); }";

/// Clicks the player's next control.
pub const CLICK_NEXT: &str =
    "var b = document.querySelector('.ytp-next-button'); if (b) { b.click(); }";

pub const IS_PLAYING: &str =
    "var v = document.querySelector('video'); return !!v && !v.paused && !v.ended;";

//! # tubepilot-driver
//!
//! One controlled browser instance per playback session, driven over the
//! WebDriver protocol (via thirtyfour).
//!
//! The crate exposes two layers:
//!
//! - [`PageDriver`] — the capability interface a playback session consumes:
//!   start/stop with bind-time launch options, navigate, fire-and-forget
//!   scripts, script evaluation, title, refresh. Tests substitute fakes at
//!   this seam.
//! - [`WebDriverHandle`] — the production implementation: a lazily started
//!   Chrome session against a chromedriver endpoint, with the proxy and
//!   profile directory applied as launch arguments.
//!
//! Proxy and profile directory are launch parameters of the underlying
//! browser process. Starting a live handle with different [`LaunchOptions`]
//! fails with `Error::ConfigurationChanged`; the caller stops and starts
//! again to pick up the new options.

mod config;
mod handle;

pub use config::{DriverConfig, LaunchOptions};
pub use handle::{
    DriverFactory, PageDriver, WebDriverFactory, WebDriverHandle, normalize_watch_url,
    strip_title_suffix,
};

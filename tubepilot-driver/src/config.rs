//! Driver configuration options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for WebDriver-backed handles.
///
/// These settings are shared by every session; the per-session launch
/// parameters live in [`LaunchOptions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// WebDriver server URL (e.g., "http://localhost:4444")
    pub webdriver_url: String,

    /// Run in headless mode (no visible window). Headless playback is
    /// unreliable for video controls, so the default is a visible browser.
    pub headless: bool,

    /// Page load timeout in seconds
    pub page_load_timeout_secs: u64,

    /// Script execution timeout in seconds
    pub script_timeout_secs: u64,

    /// Additional browser arguments
    pub browser_args: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: false,
            page_load_timeout_secs: 30,
            script_timeout_secs: 30,
            browser_args: Vec::new(),
        }
    }
}

impl DriverConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the WebDriver URL.
    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = url.into();
        self
    }

    /// Enable or disable headless mode.
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set page load timeout.
    pub fn page_load_timeout(mut self, secs: u64) -> Self {
        self.page_load_timeout_secs = secs;
        self
    }

    /// Set script execution timeout.
    pub fn script_timeout(mut self, secs: u64) -> Self {
        self.script_timeout_secs = secs;
        self
    }

    /// Add a browser argument.
    pub fn add_arg(mut self, arg: impl Into<String>) -> Self {
        self.browser_args.push(arg.into());
        self
    }
}

/// Bind-time launch parameters for one browser instance.
///
/// Both fields configure the browser process itself, so changing either
/// requires a full relaunch of the handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOptions {
    /// Network proxy, e.g. "host:port" or "socks5://host:port".
    pub proxy: Option<String>,

    /// Persistent browser profile directory.
    pub profile_dir: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the network proxy.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set the profile directory.
    pub fn profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert!(!config.headless);
        assert_eq!(config.page_load_timeout_secs, 30);
    }

    #[test]
    fn test_builder() {
        let config = DriverConfig::new()
            .webdriver_url("http://localhost:9515")
            .headless(true)
            .add_arg("--mute-audio");

        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert!(config.headless);
        assert_eq!(config.browser_args, vec!["--mute-audio".to_string()]);
    }

    #[test]
    fn test_launch_options_equality() {
        let a = LaunchOptions::new().proxy("socks5://127.0.0.1:1080");
        let b = LaunchOptions::new().proxy("socks5://127.0.0.1:1080");
        assert_eq!(a, b);

        let c = b.clone().profile_dir("/tmp/profile-1");
        assert_ne!(a, c);
    }
}

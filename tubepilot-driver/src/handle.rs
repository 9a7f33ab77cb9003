//! Driver handle: the capability trait and its WebDriver implementation.

use crate::config::{DriverConfig, LaunchOptions};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thirtyfour::prelude::*;
use tokio::sync::RwLock;
use tubepilot_core::{Error, Result};

/// Title suffixes the player appends to the document title.
const TITLE_SUFFIXES: &[&str] = &[" - YouTube", " - YouTube Music"];

/// Capability interface of one controlled browser instance.
///
/// A handle is created cold and bound to its [`LaunchOptions`] on the first
/// `start`. Proxy and profile directory are launch parameters of the browser
/// process: `start` on a live handle with different options fails with
/// [`Error::ConfigurationChanged`] and the caller must `stop` first.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Start the browser. Idempotent for identical launch options.
    async fn start(&self, launch: &LaunchOptions) -> Result<()>;

    /// Terminate the browser. Safe to call when already stopped.
    async fn stop(&self) -> Result<()>;

    /// The launch options the handle is currently running with, or `None`
    /// when stopped.
    async fn active_launch(&self) -> Option<LaunchOptions>;

    /// Navigate to a URL, auto-starting with default launch options when
    /// cold. Watch URLs are normalized as a side effect (see
    /// [`normalize_watch_url`]).
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Fire-and-forget script against the active page. A no-op (not an
    /// error) when no handle is active.
    async fn run_script(&self, src: &str) -> Result<()>;

    /// Execute a script and return its result.
    async fn eval_script(&self, src: &str) -> Result<serde_json::Value>;

    /// Best-effort page title with known player suffixes stripped.
    async fn title(&self) -> Result<String>;

    /// Reload the current page.
    async fn refresh(&self) -> Result<()>;
}

/// Produces cold driver handles. The orchestrator hands a factory to each
/// session so tests can substitute recording fakes.
pub trait DriverFactory: Send + Sync {
    fn create(&self) -> Arc<dyn PageDriver>;
}

/// Inject default playback query parameters into watch URLs.
///
/// When the host ends in "youtube.com" and the path begins with "/watch",
/// `autoplay=1` and `mute=1` are appended unless the caller already set
/// those keys. Explicit caller values are never overridden. Unparseable
/// URLs pass through untouched.
pub fn normalize_watch_url(raw: &str) -> String {
    let Ok(mut url) = url::Url::parse(raw) else {
        return raw.to_string();
    };

    let is_watch = url.host_str().is_some_and(|h| h.ends_with("youtube.com"))
        && url.path().starts_with("/watch");
    if !is_watch {
        return raw.to_string();
    }

    let has_autoplay = url.query_pairs().any(|(k, _)| k == "autoplay");
    let has_mute = url.query_pairs().any(|(k, _)| k == "mute");

    {
        let mut pairs = url.query_pairs_mut();
        if !has_autoplay {
            pairs.append_pair("autoplay", "1");
        }
        if !has_mute {
            pairs.append_pair("mute", "1");
        }
    }

    url.to_string()
}

/// Strip the player's title suffixes from a document title.
pub fn strip_title_suffix(title: &str) -> String {
    for suffix in TITLE_SUFFIXES {
        if let Some(stripped) = title.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    title.to_string()
}

struct ActiveDriver {
    driver: WebDriver,
    launch: LaunchOptions,
}

/// A driver handle backed by a WebDriver session (chromedriver endpoint).
pub struct WebDriverHandle {
    active: RwLock<Option<ActiveDriver>>,
    config: DriverConfig,
}

impl WebDriverHandle {
    /// Create a cold handle. The browser launches on the first `start` or
    /// `navigate`.
    pub fn new(config: DriverConfig) -> Self {
        Self { active: RwLock::new(None), config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn build_capabilities(&self, launch: &LaunchOptions) -> Result<Capabilities> {
        let mut caps = DesiredCapabilities::chrome();

        if self.config.headless {
            caps.add_arg("--headless=new")
                .map_err(|e| Error::Driver(format!("Failed to add headless arg: {}", e)))?;
        }
        caps.add_arg("--no-sandbox")
            .map_err(|e| Error::Driver(format!("Failed to add no-sandbox: {}", e)))?;
        caps.add_arg("--disable-dev-shm-usage")
            .map_err(|e| Error::Driver(format!("Failed to add disable-dev-shm: {}", e)))?;
        caps.add_arg("--autoplay-policy=no-user-gesture-required")
            .map_err(|e| Error::Driver(format!("Failed to add autoplay policy: {}", e)))?;

        if let Some(ref proxy) = launch.proxy {
            caps.add_arg(&format!("--proxy-server={}", proxy))
                .map_err(|e| Error::Driver(format!("Failed to add proxy arg: {}", e)))?;
        }
        if let Some(ref profile) = launch.profile_dir {
            caps.add_arg(&format!("--user-data-dir={}", profile.display()))
                .map_err(|e| Error::Driver(format!("Failed to add profile arg: {}", e)))?;
        }

        for arg in &self.config.browser_args {
            caps.add_arg(arg)
                .map_err(|e| Error::Driver(format!("Failed to add arg '{}': {}", arg, e)))?;
        }

        Ok(caps.into())
    }
}

#[async_trait]
impl PageDriver for WebDriverHandle {
    async fn start(&self, launch: &LaunchOptions) -> Result<()> {
        let mut guard = self.active.write().await;

        if let Some(active) = guard.as_ref() {
            if active.launch == *launch {
                return Ok(()); // Already running with these options
            }
            return Err(Error::ConfigurationChanged);
        }

        let caps = self.build_capabilities(launch)?;
        let driver = WebDriver::new(&self.config.webdriver_url, caps)
            .await
            .map_err(|e| Error::DriverUnavailable(format!("Failed to start browser: {}", e)))?;

        driver
            .set_page_load_timeout(Duration::from_secs(self.config.page_load_timeout_secs))
            .await
            .map_err(|e| Error::Driver(format!("Failed to set page load timeout: {}", e)))?;

        driver
            .set_script_timeout(Duration::from_secs(self.config.script_timeout_secs))
            .await
            .map_err(|e| Error::Driver(format!("Failed to set script timeout: {}", e)))?;

        tracing::info!(proxy = ?launch.proxy, profile = ?launch.profile_dir, "browser started");
        *guard = Some(ActiveDriver { driver, launch: launch.clone() });
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut guard = self.active.write().await;

        if let Some(active) = guard.take() {
            active
                .driver
                .quit()
                .await
                .map_err(|e| Error::Driver(format!("Failed to quit browser: {}", e)))?;
            tracing::info!("browser stopped");
        }

        Ok(())
    }

    async fn active_launch(&self) -> Option<LaunchOptions> {
        self.active.read().await.as_ref().map(|a| a.launch.clone())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        if self.active.read().await.is_none() {
            self.start(&LaunchOptions::default()).await?;
        }

        let target = normalize_watch_url(url);
        let guard = self.active.read().await;
        let active =
            guard.as_ref().ok_or_else(|| Error::Driver("driver not started".to_string()))?;

        active
            .driver
            .goto(target.as_str())
            .await
            .map_err(|e| Error::Driver(format!("Navigation failed: {}", e)))
    }

    async fn run_script(&self, src: &str) -> Result<()> {
        let guard = self.active.read().await;
        let Some(active) = guard.as_ref() else {
            tracing::debug!("script skipped: no active driver");
            return Ok(());
        };

        active
            .driver
            .execute(src, vec![])
            .await
            .map(|_| ())
            .map_err(|e| Error::Driver(format!("Script execution failed: {}", e)))
    }

    async fn eval_script(&self, src: &str) -> Result<serde_json::Value> {
        let guard = self.active.read().await;
        let active =
            guard.as_ref().ok_or_else(|| Error::Driver("driver not started".to_string()))?;

        let ret = active
            .driver
            .execute(src, vec![])
            .await
            .map_err(|e| Error::Driver(format!("Script evaluation failed: {}", e)))?;

        Ok(ret.json().clone())
    }

    async fn title(&self) -> Result<String> {
        let guard = self.active.read().await;
        let active =
            guard.as_ref().ok_or_else(|| Error::Driver("driver not started".to_string()))?;

        let title = active
            .driver
            .title()
            .await
            .map_err(|e| Error::Driver(format!("Failed to get title: {}", e)))?;

        Ok(strip_title_suffix(&title))
    }

    async fn refresh(&self) -> Result<()> {
        let guard = self.active.read().await;
        let active =
            guard.as_ref().ok_or_else(|| Error::Driver("driver not started".to_string()))?;

        active
            .driver
            .refresh()
            .await
            .map_err(|e| Error::Driver(format!("Refresh failed: {}", e)))
    }
}

/// Factory producing [`WebDriverHandle`]s that share one [`DriverConfig`].
pub struct WebDriverFactory {
    config: DriverConfig,
}

impl WebDriverFactory {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }
}

impl DriverFactory for WebDriverFactory {
    fn create(&self) -> Arc<dyn PageDriver> {
        Arc::new(WebDriverHandle::new(self.config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url_gets_default_params() {
        let out = normalize_watch_url("https://www.youtube.com/watch?v=X");
        assert!(out.contains("v=X"));
        assert!(out.contains("autoplay=1"));
        assert!(out.contains("mute=1"));
    }

    #[test]
    fn test_explicit_params_not_overridden() {
        let out = normalize_watch_url("https://www.youtube.com/watch?v=X&autoplay=0");
        assert!(out.contains("autoplay=0"));
        assert!(!out.contains("autoplay=1"));
        // mute was not given, so it is still injected
        assert!(out.contains("mute=1"));
    }

    #[test]
    fn test_non_watch_urls_untouched() {
        let playlist = "https://www.youtube.com/playlist?list=PL123";
        assert_eq!(normalize_watch_url(playlist), playlist);

        let other = "https://example.com/watch?v=X";
        assert_eq!(normalize_watch_url(other), other);

        let garbage = "not a url";
        assert_eq!(normalize_watch_url(garbage), garbage);
    }

    #[test]
    fn test_music_host_is_normalized() {
        let out = normalize_watch_url("https://music.youtube.com/watch?v=Y");
        assert!(out.contains("autoplay=1"));
    }

    #[test]
    fn test_title_suffix_stripped() {
        assert_eq!(strip_title_suffix("Some Video - YouTube"), "Some Video");
        assert_eq!(strip_title_suffix("Some Song - YouTube Music"), "Some Song");
        assert_eq!(strip_title_suffix("Plain title"), "Plain title");
    }

    #[tokio::test]
    async fn test_cold_handle_behavior() {
        let handle = WebDriverHandle::new(DriverConfig::default());

        assert!(handle.active_launch().await.is_none());

        // run_script on a cold handle is a silent no-op
        handle.run_script("console.log('hi')").await.unwrap();

        // stop when already stopped is safe
        handle.stop().await.unwrap();

        // eval requires a live driver
        assert!(handle.eval_script("return 1").await.is_err());
        assert!(handle.title().await.is_err());
    }
}

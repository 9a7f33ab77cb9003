//! # tubepilot-playback
//!
//! Multi-session playback orchestration: the session state machine,
//! stall/error recovery with exponential backoff, the shuffled
//! non-repeating URL queue, and the orchestrator that ticks every live
//! session.
//!
//! ## Overview
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tubepilot_driver::{DriverConfig, WebDriverFactory};
//! use tubepilot_playback::{Orchestrator, OrchestratorConfig};
//!
//! async fn example() -> tubepilot_core::Result<()> {
//!     let factory = Arc::new(WebDriverFactory::new(DriverConfig::default()));
//!     let orch = Orchestrator::new(factory, OrchestratorConfig::default());
//!
//!     orch.import_urls(["https://www.youtube.com/watch?v=A"]).await;
//!     orch.open_pending(1).await;
//!
//!     // Ad skipping and stall recovery run until the guard is dropped.
//!     let _maintenance = orch.spawn_maintenance();
//!     Ok(())
//! }
//! ```
//!
//! Sessions are driven through the [`tubepilot_driver::PageDriver`]
//! capability interface, so tests substitute scripted fakes for the real
//! WebDriver-backed handle.

mod orchestrator;
mod queue;
mod recovery;
pub mod scripts;
mod session;
mod store;

pub use orchestrator::{MaintenanceGuard, Orchestrator, OrchestratorConfig, Progress};
pub use queue::ShuffleQueue;
pub use recovery::{BACKOFF_CEILING, BACKOFF_FLOOR, CHECK_THROTTLE, RecoveryState, Snapshot};
pub use session::PlaybackSession;
pub use store::{
    SessionRecord, load_records, parse_url_list, sanitize_profile_name, save_records,
};

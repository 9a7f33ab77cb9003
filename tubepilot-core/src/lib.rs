//! # tubepilot-core
//!
//! Shared error taxonomy and result alias for the tubepilot workspace.
//!
//! Every crate in the workspace reports failures through [`Error`]; the
//! session and orchestrator layers decide which variants are surfaced to the
//! user and which are absorbed at the session boundary.

mod error;

pub use error::{Error, Result};

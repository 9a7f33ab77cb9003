/// Failure taxonomy for the playback orchestrator.
///
/// Variants map to the conditions the system distinguishes on purpose:
/// everything else a driver call can produce is classified into
/// [`Error::Driver`] and handled at the session boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither the browser nor its driver could be located or launched.
    /// Fatal to the affected session only.
    #[error("browser driver unavailable: {0}")]
    DriverUnavailable(String),

    /// The live handle was started with different launch options (proxy or
    /// profile directory). The caller must stop and start again; these are
    /// bind-time browser parameters.
    #[error("launch options changed; the browser must be relaunched")]
    ConfigurationChanged,

    /// The shuffle queue holds no playable URLs.
    #[error("no playable URLs in the queue")]
    EmptyQueue,

    /// The targeted session id is not in the orchestrator's registry.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// Any other driver interaction failure.
    #[error("driver call failed: {0}")]
    Driver(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the viewer binary.
//!
//! [`ViewerError`] wraps every failure that can stop startup, so `main`
//! can propagate with `?`. Nothing after startup is fatal.

/// Top-level error for the viewer binary.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: carbonscape_core::config::ConfigError,
    },

    /// Timeline configuration was rejected.
    #[error("timeline error: {source}")]
    Timeline {
        /// The underlying timeline error.
        #[from]
        source: carbonscape_core::timeline::TimelineError,
    },

    /// The HTTP client could not be built.
    #[error("client error: {source}")]
    Client {
        /// The underlying client error.
        #[from]
        source: carbonscape_client::ClientError,
    },

    /// Reading operator commands failed.
    #[error("input error: {source}")]
    Input {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

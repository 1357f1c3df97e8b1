//! Error types for backend calls and local persistence.
//!
//! Uses `thiserror` for typed errors. Backend failures collapse into four
//! kinds that callers branch on; the resolver turns any of them into a
//! fallback, and the session turns them into user-visible notices.

/// Failures talking to the projection backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure, timeout, or server-side error status.
    #[error("backend unavailable: {reason}")]
    NetworkUnavailable {
        /// What went wrong at the transport level.
        reason: String,
    },

    /// The backend refused the request for this identity.
    #[error("request rejected: {}", detail.as_deref().unwrap_or("no detail"))]
    AuthenticationRejected {
        /// Reason reported by the backend, if any.
        detail: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response: {reason}")]
    MalformedResponse {
        /// Decoder message.
        reason: String,
    },

    /// The backend has nothing for this identity.
    #[error("no data available: {}", detail.as_deref().unwrap_or("no detail"))]
    NoDataAvailable {
        /// Reason reported by the backend, if any.
        detail: Option<String>,
    },
}

impl ClientError {
    /// Backend-supplied detail, if the error carries one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::AuthenticationRejected { detail } | Self::NoDataAvailable { detail } => {
                detail.as_deref()
            }
            Self::NetworkUnavailable { .. } | Self::MalformedResponse { .. } => None,
        }
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        if let Some(detail) = self.detail() {
            return detail.to_owned();
        }
        match self {
            Self::NetworkUnavailable { .. } => "Server not reachable.",
            Self::AuthenticationRejected { .. } => "Request was rejected.",
            Self::MalformedResponse { .. } => "Unexpected response from server.",
            Self::NoDataAvailable { .. } => "No data available yet.",
        }
        .to_owned()
    }

    /// Classify a non-success HTTP status.
    pub(crate) fn from_status(status: reqwest::StatusCode, detail: Option<String>) -> Self {
        if status == reqwest::StatusCode::NOT_FOUND {
            Self::NoDataAvailable { detail }
        } else if status.is_client_error() {
            Self::AuthenticationRejected { detail }
        } else {
            Self::NetworkUnavailable {
                reason: detail.unwrap_or_else(|| format!("backend returned {status}")),
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse {
                reason: err.to_string(),
            }
        } else {
            Self::NetworkUnavailable {
                reason: err.to_string(),
            }
        }
    }
}

/// Failures reading or writing the local store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be (de)serialized.
    #[error("store serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The blocking store task did not complete.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

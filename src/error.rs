use thiserror::Error;

/// Failures raised while fetching and validating backend payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The endpoint answered with a non-success status code.
    #[error("{endpoint} returned http {status}")]
    Http { endpoint: String, status: u16 },

    /// The body decoded but lacks required fields, or they have the wrong type.
    #[error("{endpoint} returned an unusable body: {reason}")]
    Shape { endpoint: String, reason: String },

    /// The "last updated" lookup failed. Always recovered with the local clock.
    #[error("timestamp unavailable: {0}")]
    Timestamp(String),

    /// The request never produced a response (connect error, timeout, read error).
    #[error("{endpoint} unreachable: {message}")]
    Transport { endpoint: String, message: String },
}

impl FetchError {
    pub fn shape(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::Shape {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Http { endpoint, .. }
            | Self::Shape { endpoint, .. }
            | Self::Transport { endpoint, .. } => Some(endpoint),
            Self::Timestamp(_) => None,
        }
    }

    /// Short message for the inline error panel.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { status, .. } => {
                format!("Server error (http {status}). Please retry later.")
            }
            Self::Shape { reason, .. } => format!("Unexpected data from server: {reason}"),
            Self::Timestamp(reason) => format!("Timestamp unavailable: {reason}"),
            Self::Transport { .. } => {
                "Network error or service unavailable. Please retry later.".to_string()
            }
        }
    }
}

//! Error kinds reported by the weather and prediction operations.

use thiserror::Error;

/// Every public operation of this crate reports failures as one of these kinds.
///
/// `Display` is the bare message so it can be handed straight to a caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Caller-supplied input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The weather provider answered with a non-success code.
    #[error("{0}")]
    Upstream(String),

    /// Transport, parsing or classifier fault.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status code the error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Upstream(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Short name of the kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Upstream(_) => "upstream",
            Self::Internal(_) => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::Upstream(msg) | Self::Internal(msg) => msg,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Step-terminal failures raised by the correlation core.
///
/// Every variant embeds the raw value that caused it so the host engine can
/// record a useful failure message for the virtual-user run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorrelateError {
    #[error("missing credential: {method} {url} requires a CSRF token but none has been observed")]
    MissingCredential { method: String, url: String },
    #[error("listing body is not parseable ({reason}): {body}")]
    ParseFailure { reason: String, body: String },
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("resource still exists after delete: {0}")]
    ResourceStillExists(String),
    #[error("invalid lifecycle state: cannot {op} while {state:?}")]
    InvalidState { op: String, state: LifecycleState },
    #[error("target id required for spawn matching but run variable '{0}' is not set")]
    MissingTargetId(String),
    #[error("invalid config: {0}")]
    Config(String),
}

impl CorrelateError {
    pub(crate) fn parse_failure(reason: impl ToString, body: &str) -> Self {
        CorrelateError::ParseFailure {
            reason: reason.to_string(),
            body: body.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CorrelateError>;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures the orchestrator has to discriminate: auth errors trigger the
/// known-accounts fallback, schema errors degrade to zero results, transport
/// errors get one retry at the page level.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("provider rejected authentication ({status}): {body}")]
    Auth { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Provider { status: StatusCode, body: String },

    #[error("unrecognized response envelope (keys: {keys:?})")]
    UnexpectedSchema { keys: Vec<String> },

    #[error("reading client certificate: {0}")]
    Certificate(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// Timeouts and connection resets; candidates for one same-token retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Provider { .. })
    }
}

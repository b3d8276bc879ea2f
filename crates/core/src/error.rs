use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("SECRET_KEY must be set to a non-default value of at least {min_len} bytes in production")]
    InsecureSecret { min_len: usize },
}

/// Coarse classification shared by every backend error type.
///
/// The web layer only ever sees one of these three buckets; the detailed
/// error stays in the server log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The remote service reported an internal fault (HTTP 5xx).
    Internal,
    /// The remote API rejected the call: auth, quota, bad request, malformed response.
    Api,
    /// Anything else: transport failures, timeouts, local faults.
    Unexpected,
}

impl FailureKind {
    /// Classify a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        if status >= 500 {
            FailureKind::Internal
        } else {
            FailureKind::Api
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Internal => "internal",
            FailureKind::Api => "api",
            FailureKind::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

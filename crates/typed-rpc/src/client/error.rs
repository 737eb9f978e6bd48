//! Client-side failures

use crate::error::{BoxError, RpcErrorCode};
use crate::validation::Issue;
use crate::wire::RouterErrorDetails;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Failure of a client call. Every variant names the procedure and the
/// input that was being sent.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input or output failed the local schema check. When the input is
    /// rejected no request is sent; `output` is set when the server's
    /// output was rejected.
    #[error("validation failed for procedure '{procedure}' ({} issue(s))", .issues.len())]
    Validation {
        procedure: String,
        input: Value,
        output: Option<Value>,
        issues: Vec<Issue>,
    },

    /// The transport failed to deliver the request or produce a response.
    #[error("request to procedure '{procedure}' failed: {cause}")]
    Fetch {
        procedure: String,
        input: Value,
        #[source]
        cause: BoxError,
    },

    /// The response body could not be decoded.
    #[error("could not decode response of procedure '{procedure}': {cause}")]
    Parse {
        procedure: String,
        input: Value,
        #[source]
        cause: BoxError,
    },

    /// The server reported a failure.
    #[error("procedure '{procedure}' failed: {error}")]
    Rpc {
        procedure: String,
        input: Value,
        json_rpc_code: i32,
        error: RouterErrorDetails,
    },
}

/// Kind of a [`ClientError`], as a stable string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientErrorKind {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "FETCH_ERROR")]
    Fetch,
    #[serde(rename = "PARSE_ERROR")]
    Parse,
    #[serde(rename = "RPC_ERROR")]
    Rpc,
}

impl ClientErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Fetch => "FETCH_ERROR",
            Self::Parse => "PARSE_ERROR",
            Self::Rpc => "RPC_ERROR",
        }
    }
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ClientError {
    pub fn kind(&self) -> ClientErrorKind {
        match self {
            Self::Validation { .. } => ClientErrorKind::Validation,
            Self::Fetch { .. } => ClientErrorKind::Fetch,
            Self::Parse { .. } => ClientErrorKind::Parse,
            Self::Rpc { .. } => ClientErrorKind::Rpc,
        }
    }

    pub fn procedure(&self) -> &str {
        match self {
            Self::Validation { procedure, .. }
            | Self::Fetch { procedure, .. }
            | Self::Parse { procedure, .. }
            | Self::Rpc { procedure, .. } => procedure,
        }
    }

    pub fn input(&self) -> &Value {
        match self {
            Self::Validation { input, .. }
            | Self::Fetch { input, .. }
            | Self::Parse { input, .. }
            | Self::Rpc { input, .. } => input,
        }
    }

    /// Local issues, or the issues reported by the server.
    pub fn issues(&self) -> Option<&[Issue]> {
        match self {
            Self::Validation { issues, .. } => Some(issues.as_slice()),
            Self::Rpc { error, .. } => error.issues.as_deref(),
            Self::Fetch { .. } | Self::Parse { .. } => None,
        }
    }

    /// Remote error code, for server-reported failures.
    pub fn rpc_code(&self) -> Option<RpcErrorCode> {
        match self {
            Self::Rpc { error, .. } => Some(error.code),
            _ => None,
        }
    }

    /// Remote failure details, for server-reported failures.
    pub fn rpc_error(&self) -> Option<&RouterErrorDetails> {
        match self {
            Self::Rpc { error, .. } => Some(error),
            _ => None,
        }
    }
}

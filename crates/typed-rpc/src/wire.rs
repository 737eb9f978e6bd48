//! Response bodies exchanged between router and client
//!
//! Success:
//!
//! ```json
//! { "result": { "data": "hello world" } }
//! ```
//!
//! Failure (the transport status mirrors `data.httpStatus`):
//!
//! ```json
//! {
//!   "message": "Error parsing input",
//!   "code": -32700,
//!   "data": {
//!     "code": "PARSE_ERROR",
//!     "httpStatus": 400,
//!     "message": "Error parsing input",
//!     "issues": [{ "code": "too_small", "message": "Too short" }],
//!     "procedure": "hello"
//!   }
//! }
//! ```

use crate::error::{ErrorConfig, RpcError, RpcErrorCode};
use crate::validation::Issue;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Media type of every request and response body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Query parameter carrying the encoded input of GET requests.
pub const INPUT_QUERY_PARAM: &str = "input";

/// A decoded router response. Exactly one variant is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouterResponse {
    Success { result: SuccessPayload },
    Failure(FailurePayload),
}

impl RouterResponse {
    pub fn success(data: Value) -> Self {
        Self::Success {
            result: SuccessPayload { data },
        }
    }

    pub fn failure(details: RouterErrorDetails) -> Self {
        Self::Failure(FailurePayload::from(details))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessPayload {
    #[serde(default)]
    pub data: Value,
}

/// Top-level failure body: JSON-RPC style code plus the details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePayload {
    pub message: String,
    pub code: i32,
    pub data: RouterErrorDetails,
}

impl From<RouterErrorDetails> for FailurePayload {
    fn from(details: RouterErrorDetails) -> Self {
        Self {
            message: details.message.clone(),
            code: details.code.json_rpc_code(),
            data: details,
        }
    }
}

/// Failure details as sent over the wire and handed to router error taps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterErrorDetails {
    #[serde(deserialize_with = "code_or_internal")]
    pub code: RpcErrorCode,
    pub http_status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<Issue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl RouterErrorDetails {
    /// Project a classified error onto the wire, honoring the stack policy.
    pub fn from_error(error: &RpcError, config: &ErrorConfig) -> Self {
        Self {
            code: error.code,
            http_status: error.http_status(),
            message: error.message.clone(),
            issues: error.issues.clone(),
            stack: config.visible_stack(error),
            procedure: error.procedure.clone(),
            input: error.input.clone(),
        }
    }
}

/// Keys outside the known set (e.g. from a newer server) read as
/// `INTERNAL_SERVER_ERROR`.
fn code_or_internal<'de, D>(deserializer: D) -> Result<RpcErrorCode, D::Error>
where
    D: Deserializer<'de>,
{
    let key = String::deserialize(deserializer)?;
    Ok(key.parse().unwrap_or(RpcErrorCode::InternalServerError))
}

impl fmt::Display for RouterErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

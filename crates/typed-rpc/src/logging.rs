//! Request correlation for router logs
//!
//! Every request handled by the router runs inside an `rpc.request` span:
//!
//! ```text
//! rpc.request{request_id=0192f0c4-... procedure=hello method=GET}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::Span;

/// Unique identifier for a request, used for log correlation.
///
/// Uses UUID v7, so identifiers sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)))
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

impl From<uuid::Uuid> for RequestId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

/// Span wrapping one dispatched request.
///
/// `procedure` is recorded later, once the name has been read from the path.
pub(crate) fn request_span(request_id: &RequestId, method: &http::Method) -> Span {
    tracing::info_span!(
        "rpc.request",
        request_id = %request_id,
        procedure = tracing::field::Empty,
        method = %method,
    )
}

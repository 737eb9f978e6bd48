//! Error taxonomy shared by procedures, the router and clients
//!
//! Every failure raised on the server side is normalized into a single
//! [`RpcError`]. Its [`RpcErrorCode`] is a closed taxonomy; each code maps to
//! exactly one HTTP status and one JSON-RPC style numeric code through the
//! [`HTTP_STATUS_TABLE`] and [`JSON_RPC_CODE_TABLE`] lookup tables.
//!
//! # Example
//! ```rust,ignore
//! use typed_rpc::{RpcError, RpcErrorCode};
//!
//! let error = RpcError::new(RpcErrorCode::NotFound, "User not found");
//! let error = RpcError::not_found("User not found"); // Convenience method
//! assert_eq!(error.http_status(), 404);
//! ```

use crate::validation::Issue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Boxed error returned by handlers and middleware.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Outcome of running a procedure.
pub type RpcResult<T> = Result<T, RpcError>;

/// Result type returned by handlers and middleware steps.
///
/// Returning an [`RpcError`] keeps its code; any other error is reported to
/// the caller as `INTERNAL_SERVER_ERROR`.
pub type HandlerResult<T> = Result<T, BoxError>;

pub(crate) const INTERNAL_MESSAGE: &str = "Internal server error";

// =============================================================================
// Error Codes
// =============================================================================

/// Closed set of error kinds.
///
/// When serialized to JSON, codes are converted to SCREAMING_SNAKE_CASE
/// (e.g., `NotFound` becomes `"NOT_FOUND"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    /// Input or output failed schema validation
    ParseError,
    /// The request was malformed or invalid
    BadRequest,
    /// Authentication is required
    Unauthorized,
    /// The authenticated caller lacks permission
    Forbidden,
    /// The requested procedure or resource does not exist
    NotFound,
    /// The request verb does not match the procedure's method
    MethodNotSupported,
    Timeout,
    /// The request conflicts with current state
    Conflict,
    PreconditionFailed,
    /// The request payload exceeds size limits
    PayloadTooLarge,
    UnsupportedMediaType,
    UnprocessableContent,
    /// Rate limit exceeded
    TooManyRequests,
    ClientClosedRequest,
    /// An unexpected failure inside a handler
    InternalServerError,
    NotImplemented,
    BadGateway,
    /// The service is temporarily unavailable
    ServiceUnavailable,
    GatewayTimeout,
}

/// Error code to HTTP status.
pub const HTTP_STATUS_TABLE: &[(RpcErrorCode, u16)] = &[
    (RpcErrorCode::ParseError, 400),
    (RpcErrorCode::BadRequest, 400),
    (RpcErrorCode::Unauthorized, 401),
    (RpcErrorCode::Forbidden, 403),
    (RpcErrorCode::NotFound, 404),
    (RpcErrorCode::MethodNotSupported, 405),
    (RpcErrorCode::Timeout, 408),
    (RpcErrorCode::Conflict, 409),
    (RpcErrorCode::PreconditionFailed, 412),
    (RpcErrorCode::PayloadTooLarge, 413),
    (RpcErrorCode::UnsupportedMediaType, 415),
    (RpcErrorCode::UnprocessableContent, 422),
    (RpcErrorCode::TooManyRequests, 429),
    (RpcErrorCode::ClientClosedRequest, 499),
    (RpcErrorCode::InternalServerError, 500),
    (RpcErrorCode::NotImplemented, 501),
    (RpcErrorCode::BadGateway, 502),
    (RpcErrorCode::ServiceUnavailable, 503),
    (RpcErrorCode::GatewayTimeout, 504),
];

/// Error code to JSON-RPC code.
pub const JSON_RPC_CODE_TABLE: &[(RpcErrorCode, i32)] = &[
    (RpcErrorCode::ParseError, -32700),
    (RpcErrorCode::BadRequest, -32600),
    (RpcErrorCode::InternalServerError, -32603),
    (RpcErrorCode::Unauthorized, -32001),
    (RpcErrorCode::Forbidden, -32003),
    (RpcErrorCode::NotFound, -32004),
    (RpcErrorCode::MethodNotSupported, -32005),
    (RpcErrorCode::Timeout, -32008),
    (RpcErrorCode::Conflict, -32009),
    (RpcErrorCode::PreconditionFailed, -32012),
    (RpcErrorCode::PayloadTooLarge, -32013),
    (RpcErrorCode::UnsupportedMediaType, -32015),
    (RpcErrorCode::UnprocessableContent, -32022),
    (RpcErrorCode::TooManyRequests, -32029),
    (RpcErrorCode::ClientClosedRequest, -32099),
    (RpcErrorCode::NotImplemented, -32501),
    (RpcErrorCode::BadGateway, -32502),
    (RpcErrorCode::ServiceUnavailable, -32503),
    (RpcErrorCode::GatewayTimeout, -32504),
];

impl RpcErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [RpcErrorCode; 19] = [
        Self::ParseError,
        Self::BadRequest,
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::MethodNotSupported,
        Self::Timeout,
        Self::Conflict,
        Self::PreconditionFailed,
        Self::PayloadTooLarge,
        Self::UnsupportedMediaType,
        Self::UnprocessableContent,
        Self::TooManyRequests,
        Self::ClientClosedRequest,
        Self::InternalServerError,
        Self::NotImplemented,
        Self::BadGateway,
        Self::ServiceUnavailable,
        Self::GatewayTimeout,
    ];

    /// Wire key, e.g. `"NOT_FOUND"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            Self::Timeout => "TIMEOUT",
            Self::Conflict => "CONFLICT",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::UnprocessableContent => "UNPROCESSABLE_CONTENT",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::ClientClosedRequest => "CLIENT_CLOSED_REQUEST",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::BadGateway => "BAD_GATEWAY",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::GatewayTimeout => "GATEWAY_TIMEOUT",
        }
    }

    /// HTTP status for this code.
    pub fn http_status(&self) -> u16 {
        HTTP_STATUS_TABLE
            .iter()
            .find(|(code, _)| code == self)
            .map(|(_, status)| *status)
            .unwrap_or(500)
    }

    /// JSON-RPC code for this code.
    pub fn json_rpc_code(&self) -> i32 {
        JSON_RPC_CODE_TABLE
            .iter()
            .find(|(code, _)| code == self)
            .map(|(_, rpc)| *rpc)
            .unwrap_or(-32603)
    }

    /// Reverse lookup of a JSON-RPC code.
    pub fn from_json_rpc_code(value: i32) -> Option<Self> {
        JSON_RPC_CODE_TABLE
            .iter()
            .find(|(_, rpc)| *rpc == value)
            .map(|(code, _)| *code)
    }

    /// Reverse lookup of an HTTP status.
    ///
    /// Several codes share status 400; the first registered one
    /// (`PARSE_ERROR`) is returned for it.
    pub fn from_http_status(status: u16) -> Option<Self> {
        HTTP_STATUS_TABLE
            .iter()
            .find(|(_, s)| *s == status)
            .map(|(code, _)| *code)
    }

    /// Caller-side failure (HTTP 4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Server-side failure (HTTP 5xx).
    pub fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when parsing an unknown error code name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

impl FromStr for RpcErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|code| code.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}

// =============================================================================
// RpcError
// =============================================================================

/// The server-side error representation.
///
/// Carries the offending procedure name and input when known, validation
/// issues for `PARSE_ERROR`, and the original failure as `cause`.
///
/// # Example
/// ```rust,ignore
/// use typed_rpc::RpcError;
///
/// async fn handler(ctx: Context<Session>, id: i64) -> HandlerResult<User> {
///     if !ctx.is_admin {
///         return Err(RpcError::forbidden("Admins only").into());
///     }
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct RpcError {
    /// Taxonomy code
    pub code: RpcErrorCode,
    /// Message shown to callers
    pub message: String,
    /// Validation issues (for `PARSE_ERROR`)
    pub issues: Option<Vec<Issue>>,
    /// Procedure that raised the error
    pub procedure: Option<String>,
    /// Validated input the procedure was called with
    pub input: Option<Value>,
    /// Underlying failure
    #[source]
    pub cause: Option<Arc<dyn StdError + Send + Sync + 'static>>,
    /// Stack trace (only included in development mode)
    pub stack_trace: Option<String>,
}

impl RpcError {
    /// Error with a code and message and nothing else attached.
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            issues: None,
            procedure: None,
            input: None,
            cause: None,
            stack_trace: None,
        }
    }

    /// Attach validation issues.
    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = Some(issues);
        self
    }

    /// Stamp the procedure name.
    pub fn with_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.procedure = Some(procedure.into());
        self
    }

    /// Stamp the input value.
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Attach the underlying failure.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Attach an already boxed underlying failure.
    pub fn with_boxed_cause(mut self, cause: BoxError) -> Self {
        self.cause = Some(Arc::from(cause));
        self
    }

    /// Attach a stack trace; only surfaced in development mode.
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Record the current backtrace.
    #[cfg(debug_assertions)]
    pub fn capture_stack_trace(mut self) -> Self {
        self.stack_trace = Some(format!("{:?}", std::backtrace::Backtrace::capture()));
        self
    }

    /// No-op in release builds.
    #[cfg(not(debug_assertions))]
    pub fn capture_stack_trace(self) -> Self {
        self
    }

    /// HTTP status mapped from the code.
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// JSON-RPC code mapped from the code.
    pub fn json_rpc_code(&self) -> i32 {
        self.code.json_rpc_code()
    }

    /// Stamp procedure name and input, keeping code, message, issues and cause.
    pub(crate) fn stamped(self, procedure: &str, input: Option<Value>) -> Self {
        let mut error = self.with_procedure(procedure);
        error.input = input;
        error
    }

    /// Classify a failure raised by a handler or middleware step.
    ///
    /// An `RpcError` passes through unchanged. Anything else becomes
    /// `INTERNAL_SERVER_ERROR` with a generic message and the original error
    /// kept as `cause`.
    pub fn from_boxed(error: BoxError) -> Self {
        match error.downcast::<RpcError>() {
            Ok(rpc) => *rpc,
            Err(other) => {
                debug!(error = %other, "Wrapping non-RPC failure as internal error");
                Self::internal(INTERNAL_MESSAGE)
                    .with_boxed_cause(other)
                    .capture_stack_trace()
            }
        }
    }

    /// Classify a failure that surfaced outside procedure execution.
    ///
    /// Like [`RpcError::from_boxed`], except that a generic error keeps its
    /// own message.
    pub fn classify(error: BoxError) -> Self {
        match error.downcast::<RpcError>() {
            Ok(rpc) => *rpc,
            Err(other) => Self::internal(other.to_string())
                .with_boxed_cause(other)
                .capture_stack_trace(),
        }
    }

    // Convenience constructors

    /// Create a PARSE_ERROR error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ParseError, message)
    }

    /// Create a BAD_REQUEST error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::BadRequest, message)
    }

    /// Create an UNAUTHORIZED error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Unauthorized, message)
    }

    /// Create a FORBIDDEN error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Forbidden, message)
    }

    /// Create a NOT_FOUND error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::NotFound, message)
    }

    /// Create a METHOD_NOT_SUPPORTED error.
    pub fn method_not_supported(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::MethodNotSupported, message)
    }

    /// Create a CONFLICT error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Conflict, message)
    }

    /// Create a PAYLOAD_TOO_LARGE error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::PayloadTooLarge, message)
    }

    /// Create a TOO_MANY_REQUESTS error.
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::TooManyRequests, message)
    }

    /// Create an INTERNAL_SERVER_ERROR error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalServerError, message)
    }

    /// Create a NOT_IMPLEMENTED error.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::NotImplemented, message)
    }
}

/// Cause attached when a handler panics.
#[derive(Debug, Clone, Error)]
#[error("handler panicked: {0}")]
pub struct PanicError(pub String);

impl PanicError {
    pub(crate) fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self(message)
    }
}

// =============================================================================
// Error Configuration
// =============================================================================

/// Controls what error payloads reveal to callers.
///
/// # Example
/// ```rust,ignore
/// use typed_rpc::ErrorConfig;
///
/// // Development mode - include stack traces
/// let dev_config = ErrorConfig::development();
///
/// // Production mode - strip them
/// let prod_config = ErrorConfig::production();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorConfig {
    /// Whether to include stack traces in error payloads
    pub development_mode: bool,
}

impl ErrorConfig {
    /// Create a configuration matching the build profile.
    pub fn new() -> Self {
        Self {
            development_mode: cfg!(debug_assertions),
        }
    }

    /// Stacks included in failure payloads.
    pub fn development() -> Self {
        Self {
            development_mode: true,
        }
    }

    /// Stacks stripped from failure payloads.
    pub fn production() -> Self {
        Self {
            development_mode: false,
        }
    }

    /// Set development mode.
    #[must_use = "This method returns a new ErrorConfig and does not modify self"]
    pub fn with_development_mode(mut self, enabled: bool) -> Self {
        self.development_mode = enabled;
        self
    }

    /// Stack trace to expose for `error` under this configuration.
    pub fn visible_stack(&self, error: &RpcError) -> Option<String> {
        if self.development_mode {
            error.stack_trace.clone()
        } else {
            if error.stack_trace.is_some() {
                trace!(code = %error.code, "Removing stack trace for production mode");
            }
            None
        }
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Error Taps
// =============================================================================

/// Invoke an observational hook, swallowing any panic it raises.
pub(crate) fn observe<T: ?Sized>(hook: &(dyn Fn(&T) + Send + Sync), value: &T) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| hook(value))) {
        let panic = PanicError::from_payload(payload);
        warn!(error = %panic, "Error tap panicked; ignoring");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_code_appears_in_both_tables() {
        for code in RpcErrorCode::ALL {
            assert!(
                HTTP_STATUS_TABLE.iter().any(|(c, _)| *c == code),
                "{code} missing from HTTP status table"
            );
            assert!(
                JSON_RPC_CODE_TABLE.iter().any(|(c, _)| *c == code),
                "{code} missing from JSON-RPC table"
            );
        }
        assert_eq!(HTTP_STATUS_TABLE.len(), RpcErrorCode::ALL.len());
        assert_eq!(JSON_RPC_CODE_TABLE.len(), RpcErrorCode::ALL.len());
    }

    #[test]
    fn test_json_rpc_codes_are_unique_and_negative() {
        let codes: HashSet<i32> = JSON_RPC_CODE_TABLE.iter().map(|(_, c)| *c).collect();
        assert_eq!(codes.len(), JSON_RPC_CODE_TABLE.len());
        assert!(codes.iter().all(|c| *c < 0));
    }

    #[test]
    fn test_known_mappings() {
        assert_eq!(RpcErrorCode::ParseError.http_status(), 400);
        assert_eq!(RpcErrorCode::Unauthorized.http_status(), 401);
        assert_eq!(RpcErrorCode::NotFound.http_status(), 404);
        assert_eq!(RpcErrorCode::MethodNotSupported.http_status(), 405);
        assert_eq!(RpcErrorCode::InternalServerError.http_status(), 500);
        assert_eq!(RpcErrorCode::ParseError.json_rpc_code(), -32700);
        assert_eq!(RpcErrorCode::InternalServerError.json_rpc_code(), -32603);
    }

    #[test]
    fn test_from_http_status_prefers_first_entry() {
        assert_eq!(
            RpcErrorCode::from_http_status(400),
            Some(RpcErrorCode::ParseError)
        );
        assert_eq!(
            RpcErrorCode::from_http_status(429),
            Some(RpcErrorCode::TooManyRequests)
        );
        assert_eq!(RpcErrorCode::from_http_status(200), None);
    }

    #[test]
    fn test_code_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&RpcErrorCode::MethodNotSupported).unwrap();
        assert_eq!(json, "\"METHOD_NOT_SUPPORTED\"");
        let code: RpcErrorCode = serde_json::from_str("\"UNPROCESSABLE_CONTENT\"").unwrap();
        assert_eq!(code, RpcErrorCode::UnprocessableContent);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert_eq!("NOT_FOUND".parse::<RpcErrorCode>(), Ok(RpcErrorCode::NotFound));
        assert!("RATE_LIMITED".parse::<RpcErrorCode>().is_err());
    }

    #[test]
    fn test_client_and_server_split() {
        assert!(RpcErrorCode::Forbidden.is_client_error());
        assert!(!RpcErrorCode::Forbidden.is_server_error());
        assert!(RpcErrorCode::BadGateway.is_server_error());
    }

    #[test]
    fn test_from_boxed_passes_rpc_error_through() {
        let boxed: BoxError = Box::new(RpcError::unauthorized("who are you").with_issues(vec![]));
        let error = RpcError::from_boxed(boxed);
        assert_eq!(error.code, RpcErrorCode::Unauthorized);
        assert_eq!(error.message, "who are you");
        assert!(error.issues.is_some());
    }

    #[test]
    fn test_from_boxed_wraps_generic_error() {
        let boxed: BoxError = "disk on fire".into();
        let error = RpcError::from_boxed(boxed);
        assert_eq!(error.code, RpcErrorCode::InternalServerError);
        assert_eq!(error.message, "Internal server error");
        assert_eq!(error.cause.as_ref().unwrap().to_string(), "disk on fire");
        assert!(error.source().is_some());
    }

    #[test]
    fn test_classify_keeps_generic_message() {
        let boxed: BoxError = "disk on fire".into();
        let error = RpcError::classify(boxed);
        assert_eq!(error.code, RpcErrorCode::InternalServerError);
        assert_eq!(error.message, "disk on fire");
    }

    #[test]
    fn test_stamped_keeps_code_and_cause() {
        let error = RpcError::conflict("taken")
            .with_cause(PanicError("inner".into()))
            .stamped("users.create", Some(serde_json::json!({"name": "x"})));
        assert_eq!(error.code, RpcErrorCode::Conflict);
        assert_eq!(error.procedure.as_deref(), Some("users.create"));
        assert_eq!(error.input, Some(serde_json::json!({"name": "x"})));
        assert!(error.cause.is_some());
    }

    #[test]
    fn test_error_config_visible_stack() {
        let error = RpcError::internal("boom").with_stack_trace("at main");
        assert_eq!(
            ErrorConfig::development().visible_stack(&error).as_deref(),
            Some("at main")
        );
        assert!(ErrorConfig::production().visible_stack(&error).is_none());
    }

    #[test]
    fn test_observe_swallows_panics() {
        let hook = |error: &RpcError| {
            if error.code.is_server_error() {
                panic!("tap exploded");
            }
        };
        observe(&hook, &RpcError::internal("x"));
    }

    #[test]
    fn test_panic_error_from_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(PanicError::from_payload(payload).0, "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(PanicError::from_payload(payload).0, "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(PanicError::from_payload(payload).0, "unknown panic payload");
    }
}

// =============================================================================
// Property-Based Tests
// =============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn error_code_strategy() -> impl Strategy<Value = RpcErrorCode> {
        proptest::sample::select(RpcErrorCode::ALL.to_vec())
    }

    proptest! {
        /// JSON-RPC codes map back to the code they came from.
        #[test]
        fn prop_json_rpc_code_is_bijective(code in error_code_strategy()) {
            prop_assert_eq!(RpcErrorCode::from_json_rpc_code(code.json_rpc_code()), Some(code));
        }

        /// Names round-trip through both FromStr and serde.
        #[test]
        fn prop_code_name_round_trip(code in error_code_strategy()) {
            prop_assert_eq!(code.as_str().parse::<RpcErrorCode>().unwrap(), code);
            let json = serde_json::to_value(code).unwrap();
            prop_assert_eq!(json, Value::String(code.as_str().to_string()));
        }

        /// Every status is a 4xx or 5xx.
        #[test]
        fn prop_status_is_error_range(code in error_code_strategy()) {
            let status = code.http_status();
            prop_assert!((400..600).contains(&status));
            prop_assert_ne!(code.is_client_error(), code.is_server_error());
        }

        /// Passthrough classification never changes code or message.
        #[test]
        fn prop_from_boxed_preserves_rpc_errors(
            code in error_code_strategy(),
            message in "[a-zA-Z0-9 ]{1,50}",
        ) {
            let boxed: BoxError = Box::new(RpcError::new(code, message.clone()));
            let error = RpcError::from_boxed(boxed);
            prop_assert_eq!(error.code, code);
            prop_assert_eq!(error.message, message);
        }
    }
}

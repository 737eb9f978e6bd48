//! Router configuration
//!
//! ```rust,ignore
//! use typed_rpc::{ErrorConfig, RouterConfig};
//!
//! let config = RouterConfig::new()
//!     .with_mount_prefix("/rpc")
//!     .with_max_input_size(256 * 1024)
//!     .with_error(ErrorConfig::production());
//! config.validate()?;
//! ```

use crate::error::ErrorConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum accepted input size in bytes (1 MiB).
pub const DEFAULT_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// max_input_size must be greater than 0
    #[error("max_input_size must be greater than 0")]
    InvalidMaxInputSize,
    /// A non-empty mount prefix must start with `/`
    #[error("mount_prefix must start with '/', got {0:?}")]
    InvalidMountPrefix(String),
}

/// Settings applied by a [`Router`](crate::Router) when serving requests.
///
/// # Fields
///
/// * `error` - Controls whether stack traces reach failure payloads.
///   Default: [`ErrorConfig::new()`], development mode in debug builds.
///
/// * `max_input_size` - Maximum size in bytes of the GET `input` parameter
///   or the POST body. Larger inputs are rejected with `PAYLOAD_TOO_LARGE`.
///   Default: 1MB (1,048,576 bytes).
///
/// * `mount_prefix` - Path prefix stripped before the procedure name is
///   read from a request URI, e.g. `/rpc`. Default: empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Error payload settings
    pub error: ErrorConfig,
    /// Maximum input size in bytes (default: 1MB)
    pub max_input_size: usize,
    /// Prefix in front of procedure names (default: none)
    pub mount_prefix: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            error: ErrorConfig::new(),
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            mount_prefix: String::new(),
        }
    }
}

impl RouterConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return an error if invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `max_input_size` is 0
    /// - `mount_prefix` is non-empty and does not start with `/`
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_input_size == 0 {
            return Err(ConfigValidationError::InvalidMaxInputSize);
        }
        if !self.mount_prefix.is_empty() && !self.mount_prefix.starts_with('/') {
            return Err(ConfigValidationError::InvalidMountPrefix(
                self.mount_prefix.clone(),
            ));
        }
        Ok(())
    }

    #[must_use = "This method returns a new RouterConfig and does not modify self"]
    pub fn with_error(mut self, error: ErrorConfig) -> Self {
        self.error = error;
        self
    }

    /// Shortcut for toggling development mode on the error settings.
    #[must_use = "This method returns a new RouterConfig and does not modify self"]
    pub fn with_development_mode(mut self, enabled: bool) -> Self {
        self.error = self.error.with_development_mode(enabled);
        self
    }

    /// Set the maximum input size in bytes.
    #[must_use = "This method returns a new RouterConfig and does not modify self"]
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// Set the mount prefix, e.g. `/rpc`. A trailing slash is dropped.
    #[must_use = "This method returns a new RouterConfig and does not modify self"]
    pub fn with_mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.mount_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    /// Strip the mount prefix from a request path.
    ///
    /// Returns `None` when the path lies outside the prefix.
    pub(crate) fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.mount_prefix.is_empty() {
            return Some(path);
        }
        let rest = path.strip_prefix(self.mount_prefix.as_str())?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }
}

//! Validation issues and struct-level validation
//!
//! Schemas report failures as a list of [`Issue`]s. Struct inputs parsed with
//! [`s::typed`](crate::schema::s::typed) additionally run their [`Validate`]
//! implementation, usually written with the [`ValidationRules`] builder.
//!
//! # Example
//!
//! ```rust,ignore
//! use typed_rpc::validation::{Validate, ValidationResult, ValidationRules};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct CreateUserInput {
//!     name: String,
//!     email: String,
//!     age: i64,
//! }
//!
//! impl Validate for CreateUserInput {
//!     fn validate(&self) -> ValidationResult {
//!         ValidationRules::new()
//!             .required("name", &self.name)
//!             .min_length("name", &self.name, 2)
//!             .email("email", &self.email)
//!             .range("age", self.age, 0, 150)
//!             .build()
//!     }
//! }
//! ```

use crate::{RpcError, RpcResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, trace, warn};

/// One step into a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{}", key),
            Self::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Machine-readable failure kind (e.g. "too_small", "invalid_type")
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Location of the offending value; empty for the root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl Issue {
    /// Create a new issue at the root.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: Vec::new(),
        }
    }

    /// Set the full path.
    pub fn at(mut self, path: impl IntoIterator<Item = PathSegment>) -> Self {
        self.path = path.into_iter().collect();
        self
    }

    /// Prepend a segment, used when a nested schema reports upwards.
    pub fn nested(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    /// Dotted rendering of the path, e.g. `items[2].name`.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(_) => out.push_str(&segment.to_string()),
            }
        }
        out
    }

    /// The value had the wrong JSON type.
    pub fn invalid_type(expected: &str, received: &Value) -> Self {
        Self::new(
            "invalid_type",
            format!("Expected {}, received {}", expected, json_type_name(received)),
        )
    }

    /// A required field is missing or blank.
    pub fn required(field: &str) -> Self {
        Self::new("required", format!("{} is required", field)).nested(field)
    }

    /// A string or array is shorter than allowed.
    pub fn too_small(min: usize, unit: &str) -> Self {
        Self::new(
            "too_small",
            format!("Must contain at least {} {}", min, unit),
        )
    }

    /// A string or array is longer than allowed.
    pub fn too_big(max: usize, unit: &str) -> Self {
        Self::new("too_big", format!("Must contain at most {} {}", max, unit))
    }

    /// A number is outside its bounds.
    pub fn out_of_range(value: impl fmt::Display, min: Option<f64>, max: Option<f64>) -> Self {
        let message = match (min, max) {
            (Some(min), Some(max)) => format!("{} must be between {} and {}", value, min, max),
            (Some(min), None) => format!("{} must be greater than or equal to {}", value, min),
            (None, Some(max)) => format!("{} must be less than or equal to {}", value, max),
            (None, None) => format!("{} is out of range", value),
        };
        Self::new("out_of_range", message)
    }

    /// A string does not match a pattern.
    pub fn pattern(pattern: &str) -> Self {
        Self::new("invalid_string", format!("Must match pattern: {}", pattern))
    }

    /// A string is not an email address.
    pub fn email() -> Self {
        Self::new("invalid_string", "Must be a valid email address")
    }

    /// A custom failure.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new("custom", message)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path_string(), self.message)
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Simple email check: one `@`, non-empty local part, dotted domain.
pub(crate) fn looks_like_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// Result of validating a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the value is valid
    pub valid: bool,
    /// Issues found (empty if valid)
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        trace!("Validation passed");
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    /// Create a validation result from a list of issues.
    /// If the list is empty, the result is valid.
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        if !issues.is_empty() {
            let paths: Vec<_> = issues.iter().map(Issue::path_string).collect();
            debug!(issue_count = issues.len(), paths = ?paths, "Validation failed");
        }
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Merge another validation result into this one
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.issues.extend(other.issues);
        self.valid = self.issues.is_empty();
        self
    }

    /// Convert into a `Result`, keeping the issues on failure.
    pub fn into_result(self) -> Result<(), Vec<Issue>> {
        if self.valid { Ok(()) } else { Err(self.issues) }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Trait for struct-level validation run after deserialization.
pub trait Validate {
    /// Validate the value and return a result with any issues
    fn validate(&self) -> ValidationResult;
}

impl Validate for () {
    fn validate(&self) -> ValidationResult {
        ValidationResult::ok()
    }
}

impl Validate for Value {
    fn validate(&self) -> ValidationResult {
        ValidationResult::ok()
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> ValidationResult {
        match self {
            Some(value) => value.validate(),
            None => ValidationResult::ok(),
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> ValidationResult {
        let issues = self
            .iter()
            .enumerate()
            .flat_map(|(i, item)| {
                item.validate()
                    .issues
                    .into_iter()
                    .map(move |issue| issue.nested(i))
            })
            .collect();
        ValidationResult::from_issues(issues)
    }
}

/// Builder for field validation rules.
///
/// ```rust,ignore
/// let result = ValidationRules::new()
///     .required("name", &input.name)
///     .max_length("name", &input.name, 100)
///     .pattern("phone", &input.phone, r"^\+?[0-9]{10,15}$")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ValidationRules {
    issues: Vec<Issue>,
}

impl ValidationRules {
    /// Create a new validation rules builder
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue as-is
    pub fn add_issue(mut self, issue: Issue) -> Self {
        self.issues.push(issue);
        self
    }

    /// Validate that a string field is not blank
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            trace!(field = %field, "Required field is empty");
            self.issues.push(Issue::required(field));
        }
        self
    }

    /// Validate minimum string length (in characters)
    pub fn min_length(mut self, field: &str, value: &str, min: usize) -> Self {
        if value.chars().count() < min {
            self.issues
                .push(Issue::too_small(min, "character(s)").nested(field));
        }
        self
    }

    /// Validate maximum string length (in characters)
    pub fn max_length(mut self, field: &str, value: &str, max: usize) -> Self {
        if value.chars().count() > max {
            self.issues.push(Issue::too_big(max, "character(s)").nested(field));
        }
        self
    }

    /// Validate that an integer is within a range (inclusive)
    pub fn range(mut self, field: &str, value: i64, min: i64, max: i64) -> Self {
        if value < min || value > max {
            self.issues.push(
                Issue::out_of_range(field, Some(min as f64), Some(max as f64)).nested(field),
            );
        }
        self
    }

    /// Validate that a string matches a regex pattern
    pub fn pattern(mut self, field: &str, value: &str, pattern: &str) -> Self {
        match regex::Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(value) {
                    self.issues.push(Issue::pattern(pattern).nested(field));
                }
            }
            Err(e) => {
                warn!(field = %field, pattern = %pattern, error = %e, "Invalid validation regex pattern");
                self.issues.push(
                    Issue::new(
                        "invalid_pattern",
                        format!("Invalid validation pattern: {}", pattern),
                    )
                    .nested(field),
                );
            }
        }
        self
    }

    /// Validate that a string is an email address
    pub fn email(mut self, field: &str, value: &str) -> Self {
        if !looks_like_email(value) {
            self.issues.push(Issue::email().nested(field));
        }
        self
    }

    /// Add a custom validation with a predicate
    pub fn custom<F>(mut self, field: &str, predicate: F, message: &str) -> Self
    where
        F: FnOnce() -> bool,
    {
        if !predicate() {
            self.issues.push(Issue::custom(message).nested(field));
        }
        self
    }

    /// Build the validation result
    pub fn build(self) -> ValidationResult {
        ValidationResult::from_issues(self.issues)
    }
}

/// Reject raw payloads above `max` bytes before decoding them.
pub(crate) fn check_input_size(size: usize, max: usize) -> RpcResult<()> {
    if size > max {
        debug!(size = size, max = max, "Input exceeds size limit");
        return Err(RpcError::payload_too_large(format!(
            "Input size {} bytes exceeds maximum {} bytes",
            size, max
        )));
    }
    Ok(())
}

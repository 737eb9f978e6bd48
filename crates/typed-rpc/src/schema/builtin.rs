//! Built-in schemas, constructed through the [`s`] module

use super::{ErasedSchema, Schema, TypeSchema};
use crate::validation::{Issue, Validate, looks_like_email};
use regex::Regex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Schema constructors.
pub mod s {
    use super::*;

    /// A string.
    pub fn string() -> StringSchema {
        StringSchema::default()
    }

    /// A floating point number.
    pub fn number() -> NumberSchema {
        NumberSchema::default()
    }

    /// A whole number fitting in `i64`.
    pub fn integer() -> IntegerSchema {
        IntegerSchema::default()
    }

    pub fn boolean() -> BooleanSchema {
        BooleanSchema
    }

    /// Only `null`; parses to `()`.
    pub fn null() -> NullSchema {
        NullSchema
    }

    /// Anything, passed through untouched.
    pub fn any() -> AnySchema {
        AnySchema
    }

    /// An array whose items all match `item`.
    pub fn array<S: Schema>(item: S) -> ArraySchema<S> {
        ArraySchema {
            item,
            min_items: None,
            max_items: None,
        }
    }

    /// `null` or a value matching `inner`.
    pub fn optional<S: Schema>(inner: S) -> OptionalSchema<S> {
        OptionalSchema { inner }
    }

    /// One of a fixed set of strings.
    pub fn literal_enum<I, T>(values: I) -> EnumSchema
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        EnumSchema {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// An object with declared fields; unknown keys are dropped.
    pub fn object() -> ObjectSchema {
        ObjectSchema::default()
    }

    /// A serde type, checked with its [`Validate`] implementation.
    pub fn typed<T>() -> TypedSchema<T>
    where
        T: Serialize + DeserializeOwned + Validate + Send + Sync + 'static,
    {
        TypedSchema {
            description: TypeSchema::any(),
            _marker: PhantomData,
        }
    }
}

// =============================================================================
// String
// =============================================================================

#[derive(Debug, Clone)]
enum StringRule {
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
    InvalidPattern(String),
    Email,
}

#[derive(Debug, Clone)]
struct StringCheck {
    rule: StringRule,
    message: Option<String>,
}

impl StringCheck {
    fn failure(&self, value: &str, len: usize) -> Option<Issue> {
        let issue = match &self.rule {
            StringRule::MinLength(min) if len < *min => Issue::too_small(*min, "character(s)"),
            StringRule::MaxLength(max) if len > *max => Issue::too_big(*max, "character(s)"),
            StringRule::Pattern(re) if !re.is_match(value) => Issue::pattern(re.as_str()),
            StringRule::InvalidPattern(pattern) => Issue::new(
                "invalid_pattern",
                format!("Invalid validation pattern: {}", pattern),
            ),
            StringRule::Email if !looks_like_email(value) => Issue::email(),
            _ => return None,
        };
        Some(match &self.message {
            Some(message) => Issue {
                message: message.clone(),
                ..issue
            },
            None => issue,
        })
    }
}

/// String schema; length is counted in characters.
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    checks: Vec<StringCheck>,
    description: Option<String>,
}

impl StringSchema {
    fn check(mut self, rule: StringRule) -> Self {
        self.checks.push(StringCheck {
            rule,
            message: None,
        });
        self
    }

    pub fn min_length(self, min: usize) -> Self {
        self.check(StringRule::MinLength(min))
    }

    pub fn max_length(self, max: usize) -> Self {
        self.check(StringRule::MaxLength(max))
    }

    /// Require a regex match. An invalid pattern rejects every value.
    pub fn pattern(self, pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => self.check(StringRule::Pattern(re)),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid schema regex pattern");
                self.check(StringRule::InvalidPattern(pattern.to_string()))
            }
        }
    }

    pub fn email(self) -> Self {
        self.check(StringRule::Email)
    }

    /// Override the message of the most recently added check.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        if let Some(last) = self.checks.last_mut() {
            last.message = Some(message.into());
        }
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Schema for StringSchema {
    type Output = String;

    fn parse(&self, value: &Value) -> Result<String, Vec<Issue>> {
        let Value::String(s) = value else {
            return Err(vec![Issue::invalid_type("string", value)]);
        };
        let len = s.chars().count();
        let issues: Vec<Issue> = self
            .checks
            .iter()
            .filter_map(|check| check.failure(s, len))
            .collect();
        if issues.is_empty() {
            Ok(s.clone())
        } else {
            Err(issues)
        }
    }

    fn describe(&self) -> TypeSchema {
        let mut schema = TypeSchema::string();
        for check in &self.checks {
            schema = match &check.rule {
                StringRule::MinLength(min) => schema.with_min_length(*min),
                StringRule::MaxLength(max) => schema.with_max_length(*max),
                StringRule::Pattern(re) => schema.with_pattern(re.as_str()),
                StringRule::InvalidPattern(pattern) => schema.with_pattern(pattern.as_str()),
                StringRule::Email => schema.with_format("email"),
            };
        }
        if let Some(description) = &self.description {
            schema = schema.with_description(description);
        }
        schema
    }
}

// =============================================================================
// Numbers, booleans, null, any
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    min: Option<f64>,
    max: Option<f64>,
}

impl NumberSchema {
    /// Inclusive lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

impl Schema for NumberSchema {
    type Output = f64;

    fn parse(&self, value: &Value) -> Result<f64, Vec<Issue>> {
        let Some(n) = value.as_f64() else {
            return Err(vec![Issue::invalid_type("number", value)]);
        };
        if self.min.is_some_and(|min| n < min) || self.max.is_some_and(|max| n > max) {
            return Err(vec![Issue::out_of_range(n, self.min, self.max)]);
        }
        Ok(n)
    }

    fn describe(&self) -> TypeSchema {
        let mut schema = TypeSchema::number();
        schema.minimum = self.min;
        schema.maximum = self.max;
        schema
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntegerSchema {
    min: Option<i64>,
    max: Option<i64>,
}

impl IntegerSchema {
    /// Inclusive lower bound.
    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound.
    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }
}

impl Schema for IntegerSchema {
    type Output = i64;

    fn parse(&self, value: &Value) -> Result<i64, Vec<Issue>> {
        let Some(n) = value.as_i64() else {
            return Err(vec![Issue::invalid_type("integer", value)]);
        };
        if self.min.is_some_and(|min| n < min) || self.max.is_some_and(|max| n > max) {
            return Err(vec![Issue::out_of_range(
                n,
                self.min.map(|v| v as f64),
                self.max.map(|v| v as f64),
            )]);
        }
        Ok(n)
    }

    fn describe(&self) -> TypeSchema {
        let mut schema = TypeSchema::integer();
        schema.minimum = self.min.map(|v| v as f64);
        schema.maximum = self.max.map(|v| v as f64);
        schema
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanSchema;

impl Schema for BooleanSchema {
    type Output = bool;

    fn parse(&self, value: &Value) -> Result<bool, Vec<Issue>> {
        value
            .as_bool()
            .ok_or_else(|| vec![Issue::invalid_type("boolean", value)])
    }

    fn describe(&self) -> TypeSchema {
        TypeSchema::boolean()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSchema;

impl Schema for NullSchema {
    type Output = ();

    fn parse(&self, value: &Value) -> Result<(), Vec<Issue>> {
        if value.is_null() {
            Ok(())
        } else {
            Err(vec![Issue::invalid_type("null", value)])
        }
    }

    fn describe(&self) -> TypeSchema {
        TypeSchema::null()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnySchema;

impl Schema for AnySchema {
    type Output = Value;

    fn parse(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        Ok(value.clone())
    }

    fn describe(&self) -> TypeSchema {
        TypeSchema::any()
    }
}

// =============================================================================
// Combinators
// =============================================================================

#[derive(Debug, Clone)]
pub struct ArraySchema<S> {
    item: S,
    min_items: Option<usize>,
    max_items: Option<usize>,
}

impl<S: Schema> ArraySchema<S> {
    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }
}

impl<S: Schema> Schema for ArraySchema<S> {
    type Output = Vec<S::Output>;

    fn parse(&self, value: &Value) -> Result<Self::Output, Vec<Issue>> {
        let Value::Array(items) = value else {
            return Err(vec![Issue::invalid_type("array", value)]);
        };

        let mut issues = Vec::new();
        if let Some(min) = self.min_items.filter(|min| items.len() < *min) {
            issues.push(Issue::too_small(min, "item(s)"));
        }
        if let Some(max) = self.max_items.filter(|max| items.len() > *max) {
            issues.push(Issue::too_big(max, "item(s)"));
        }

        let mut parsed = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match self.item.parse(item) {
                Ok(value) => parsed.push(value),
                Err(nested) => issues.extend(nested.into_iter().map(|i| i.nested(index))),
            }
        }

        if issues.is_empty() {
            Ok(parsed)
        } else {
            Err(issues)
        }
    }

    fn describe(&self) -> TypeSchema {
        let mut schema = TypeSchema::array(self.item.describe());
        schema.min_items = self.min_items;
        schema.max_items = self.max_items;
        schema
    }
}

#[derive(Debug, Clone)]
pub struct OptionalSchema<S> {
    inner: S,
}

impl<S: Schema> Schema for OptionalSchema<S> {
    type Output = Option<S::Output>;

    fn parse(&self, value: &Value) -> Result<Self::Output, Vec<Issue>> {
        if value.is_null() {
            Ok(None)
        } else {
            self.inner.parse(value).map(Some)
        }
    }

    fn describe(&self) -> TypeSchema {
        self.inner.describe().nullable()
    }
}

#[derive(Debug, Clone)]
pub struct EnumSchema {
    values: Vec<String>,
}

impl Schema for EnumSchema {
    type Output = String;

    fn parse(&self, value: &Value) -> Result<String, Vec<Issue>> {
        match value.as_str() {
            Some(s) if self.values.iter().any(|v| v == s) => Ok(s.to_string()),
            _ => Err(vec![Issue::new(
                "invalid_enum_value",
                format!("Expected one of: {}", self.values.join(", ")),
            )]),
        }
    }

    fn describe(&self) -> TypeSchema {
        TypeSchema::string().with_enum(&self.values)
    }
}

struct FieldDef {
    name: String,
    schema: Arc<dyn ErasedSchema>,
    required: bool,
}

/// Object schema with untyped output; use [`s::typed`] to get a struct.
#[derive(Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<Arc<FieldDef>>,
    description: Option<String>,
}

impl ObjectSchema {
    /// Add a required field.
    pub fn field<S: Schema>(mut self, name: impl Into<String>, schema: S) -> Self {
        self.fields.push(Arc::new(FieldDef {
            name: name.into(),
            schema: Arc::new(schema),
            required: true,
        }));
        self
    }

    /// Add a field that may be missing or null.
    pub fn optional_field<S: Schema>(mut self, name: impl Into<String>, schema: S) -> Self {
        self.fields.push(Arc::new(FieldDef {
            name: name.into(),
            schema: Arc::new(schema),
            required: false,
        }));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl std::fmt::Debug for ObjectSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.fields.iter().map(|field| field.name.as_str()).collect();
        f.debug_struct("ObjectSchema")
            .field("fields", &names)
            .finish()
    }
}

impl Schema for ObjectSchema {
    type Output = Map<String, Value>;

    fn parse(&self, value: &Value) -> Result<Self::Output, Vec<Issue>> {
        let Value::Object(object) = value else {
            return Err(vec![Issue::invalid_type("object", value)]);
        };

        let mut parsed = Map::new();
        let mut issues = Vec::new();
        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) if !field.required => {}
                None => issues.push(Issue::required(&field.name)),
                Some(raw) => match field.schema.parse_value(raw) {
                    Ok(v) => {
                        parsed.insert(field.name.clone(), v);
                    }
                    Err(nested) => issues.extend(
                        nested
                            .into_iter()
                            .map(|i| i.nested(field.name.as_str())),
                    ),
                },
            }
        }

        if issues.is_empty() {
            Ok(parsed)
        } else {
            Err(issues)
        }
    }

    fn describe(&self) -> TypeSchema {
        let mut schema = TypeSchema::object();
        for field in &self.fields {
            schema = schema.with_property(&field.name, field.schema.describe_erased());
            if field.required {
                schema = schema.with_required(&field.name);
            }
        }
        if let Some(description) = &self.description {
            schema = schema.with_description(description);
        }
        schema
    }
}

/// Deserializes into `T`, then runs `T::validate`.
pub struct TypedSchema<T> {
    description: TypeSchema,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    /// Set the portable description published for this type.
    pub fn describe_as(mut self, description: TypeSchema) -> Self {
        self.description = description;
        self
    }
}

impl<T> Clone for TypedSchema<T> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: Serialize + DeserializeOwned + Validate + Send + Sync + 'static,
{
    type Output = T;

    fn parse(&self, value: &Value) -> Result<T, Vec<Issue>> {
        let parsed = T::deserialize(value)
            .map_err(|e| vec![Issue::new("invalid_type", e.to_string())])?;
        parsed.validate().into_result()?;
        Ok(parsed)
    }

    fn describe(&self) -> TypeSchema {
        self.description.clone()
    }
}

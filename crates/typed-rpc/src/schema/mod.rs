//! Schemas: runtime validation plus a portable description
//!
//! A [`Schema`] turns an untyped JSON value into a typed value or a list of
//! [`Issue`]s, and describes itself as a [`TypeSchema`] for contract
//! publishing. Validation is synchronous.
//!
//! # Example
//!
//! ```rust,ignore
//! use typed_rpc::schema::s;
//!
//! let name = s::string().min_length(5).message("Too short");
//! let user = s::object()
//!     .field("name", name)
//!     .optional_field("age", s::integer().min(0));
//! ```

mod builtin;
mod export;
mod types;

pub use builtin::s;
pub use builtin::{
    AnySchema, ArraySchema, BooleanSchema, EnumSchema, IntegerSchema, NullSchema, NumberSchema,
    ObjectSchema, OptionalSchema, StringSchema, TypedSchema,
};
pub use export::{ProcedureSpec, ProcedureSpecs};
pub use types::TypeSchema;

use crate::validation::Issue;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;

/// A validation capability: value in, typed value or issues out.
pub trait Schema: Send + Sync + 'static {
    /// The typed value produced on success
    type Output: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Validate and convert `value`.
    fn parse(&self, value: &Value) -> Result<Self::Output, Vec<Issue>>;

    /// Portable description of accepted values.
    fn describe(&self) -> TypeSchema;
}

/// Shared, type-erased handle to a schema producing `T`.
pub type SharedSchema<T> = Arc<dyn Schema<Output = T>>;

/// Schema usable inside an untyped object field.
pub(crate) trait ErasedSchema: Send + Sync {
    fn parse_value(&self, value: &Value) -> Result<Value, Vec<Issue>>;
    fn describe_erased(&self) -> TypeSchema;
}

impl<S: Schema> ErasedSchema for S {
    fn parse_value(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        let parsed = self.parse(value)?;
        serde_json::to_value(parsed).map_err(|e| vec![Issue::custom(e.to_string())])
    }

    fn describe_erased(&self) -> TypeSchema {
        self.describe()
    }
}

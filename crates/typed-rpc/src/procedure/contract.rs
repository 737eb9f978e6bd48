//! Public shape of a procedure, shared by server and client

use crate::middleware::ProcedureType;
use crate::schema::{ProcedureSpec, SharedSchema};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::sync::Arc;

/// Name, transport method and schemas of a procedure, without its handler.
///
/// Obtain one from a built [`Procedure`](crate::Procedure) or directly from a
/// builder with
/// [`contract_query`](crate::ProcedureBuilder::contract_query) /
/// [`contract_mutation`](crate::ProcedureBuilder::contract_mutation) when
/// the client should not link the server code.
pub struct ProcedureContract<I, O> {
    name: Arc<str>,
    procedure_type: ProcedureType,
    input: SharedSchema<I>,
    output: SharedSchema<O>,
}

impl<I, O> ProcedureContract<I, O> {
    pub(crate) fn new(
        name: Arc<str>,
        procedure_type: ProcedureType,
        input: SharedSchema<I>,
        output: SharedSchema<O>,
    ) -> Self {
        Self {
            name,
            procedure_type,
            input,
            output,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn procedure_type(&self) -> ProcedureType {
        self.procedure_type
    }

    /// Transport verb requests must use.
    pub fn method(&self) -> http::Method {
        self.procedure_type.http_method()
    }

    pub fn input_schema(&self) -> &SharedSchema<I> {
        &self.input
    }

    pub fn output_schema(&self) -> &SharedSchema<O> {
        &self.output
    }

    /// Portable description for contract publishing.
    pub fn spec(&self) -> ProcedureSpec
    where
        I: Serialize + DeserializeOwned + Send + Sync + 'static,
        O: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        ProcedureSpec {
            name: self.name.to_string(),
            method: self.procedure_type,
            input_schema: self.input.describe(),
            output_schema: self.output.describe(),
        }
    }
}

impl<I, O> Clone for ProcedureContract<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            procedure_type: self.procedure_type,
            input: self.input.clone(),
            output: self.output.clone(),
        }
    }
}

impl<I, O> fmt::Debug for ProcedureContract<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureContract")
            .field("name", &self.name)
            .field("procedure_type", &self.procedure_type)
            .finish()
    }
}

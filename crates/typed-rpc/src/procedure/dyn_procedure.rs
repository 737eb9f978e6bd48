//! Type-erased procedure interface used by the router

use super::callable::Procedure;
use crate::error::{INTERNAL_MESSAGE, RpcError, RpcResult};
use crate::middleware::ProcedureType;
use crate::schema::ProcedureSpec;
use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// A procedure with its input and output types erased to JSON values.
///
/// Implemented for every [`Procedure`] whose seed context is `Ctx`, so
/// procedures with different input and output types share one registry.
pub trait DynProcedure<Ctx>: Send + Sync {
    fn name(&self) -> &str;

    fn procedure_type(&self) -> ProcedureType;

    fn mocked(&self) -> bool;

    fn spec(&self) -> ProcedureSpec;

    /// Run the pipeline on an untyped input and serialize the output.
    fn call_value(&self, ctx: Ctx, input: Value) -> BoxFuture<'static, RpcResult<Value>>;
}

impl<Ctx, I, O> DynProcedure<Ctx> for Procedure<Ctx, I, O>
where
    Ctx: Send + 'static,
    I: Serialize + DeserializeOwned + Send + Sync + 'static,
    O: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        Procedure::name(self)
    }

    fn procedure_type(&self) -> ProcedureType {
        Procedure::procedure_type(self)
    }

    fn mocked(&self) -> bool {
        Procedure::mocked(self)
    }

    fn spec(&self) -> ProcedureSpec {
        self.contract().spec()
    }

    fn call_value(&self, ctx: Ctx, input: Value) -> BoxFuture<'static, RpcResult<Value>> {
        let procedure = self.clone();
        Box::pin(async move {
            let output = procedure.try_call_value(ctx, input).await?;
            serde_json::to_value(output).map_err(|e| {
                RpcError::internal(INTERNAL_MESSAGE)
                    .with_cause(e)
                    .with_procedure(procedure.name())
            })
        })
    }
}

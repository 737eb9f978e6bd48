//! Built procedures

use super::contract::ProcedureContract;
use super::pipeline::{INPUT_PARSE_MESSAGE, Invoke};
use crate::error::{RpcError, RpcResult};
use crate::middleware::ProcedureType;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A frozen procedure: its contract plus a callable pipeline.
///
/// Cloning is cheap; clones share the same pipeline.
///
/// # Example
/// ```rust,ignore
/// let hello = procedure
///     .name("hello")
///     .input(s::string().min_length(5))
///     .output(s::string())
///     .query(|_ctx, name: String| async move { Ok(format!("hello {name}")) });
///
/// assert_eq!(hello.try_call(AppContext, "world".into()).await?, "hello world");
/// ```
pub struct Procedure<Seed, I, O> {
    contract: ProcedureContract<I, O>,
    invoker: Arc<dyn Invoke<Seed, I, O>>,
}

impl<Seed, I, O> Procedure<Seed, I, O>
where
    Seed: Send + 'static,
    I: Serialize + DeserializeOwned + Send + Sync + 'static,
    O: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub(crate) fn new(contract: ProcedureContract<I, O>, invoker: Arc<dyn Invoke<Seed, I, O>>) -> Self {
        Self { contract, invoker }
    }

    /// Public contract, usable by clients.
    pub fn contract(&self) -> &ProcedureContract<I, O> {
        &self.contract
    }

    pub fn name(&self) -> &str {
        self.contract.name()
    }

    pub fn procedure_type(&self) -> ProcedureType {
        self.contract.procedure_type()
    }

    /// Whether this procedure skips validation and middleware.
    pub fn mocked(&self) -> bool {
        self.invoker.mocked()
    }

    /// Run the procedure, returning the error as a value.
    pub async fn try_call(&self, ctx: Seed, input: I) -> RpcResult<O> {
        let raw = serde_json::to_value(&input).map_err(|e| {
            RpcError::parse(INPUT_PARSE_MESSAGE)
                .with_cause(e)
                .with_procedure(self.name())
        })?;
        self.invoker.clone().invoke(ctx, raw).await
    }

    /// Run the procedure, raising the error into the caller's error type.
    ///
    /// ```rust,ignore
    /// async fn handler(ctx: Context<App>, id: i64) -> HandlerResult<Profile> {
    ///     let user = get_user.call::<BoxError>(ctx.inner().clone(), id).await?;
    ///     // ...
    /// }
    /// ```
    pub async fn call<E>(&self, ctx: Seed, input: I) -> Result<O, E>
    where
        E: From<RpcError>,
    {
        self.try_call(ctx, input).await.map_err(E::from)
    }

    /// Run the procedure on an untyped input value.
    pub async fn try_call_value(&self, ctx: Seed, input: Value) -> RpcResult<O> {
        self.invoker.clone().invoke(ctx, input).await
    }
}

impl<Seed, I, O> Clone for Procedure<Seed, I, O> {
    fn clone(&self) -> Self {
        Self {
            contract: self.contract.clone(),
            invoker: self.invoker.clone(),
        }
    }
}

impl<Seed, I, O> fmt::Debug for Procedure<Seed, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.contract.name())
            .field("procedure_type", &self.contract.procedure_type())
            .field("mocked", &self.invoker.mocked())
            .finish()
    }
}

//! In-process procedure calls

use crate::error::{BoxError, RpcError, RpcResult};
use crate::procedure::Procedure;
use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

type ContextFactory<Ctx> = Arc<dyn Fn() -> BoxFuture<'static, Result<Ctx, BoxError>> + Send + Sync>;

/// Calls procedures directly, with a context built per call.
///
/// Useful from background jobs, scripts and tests, where there is no
/// request to route.
///
/// ```rust,ignore
/// let caller = DirectCaller::new(|| async { Ok(AppContext::system()) });
/// let user = caller.try_call(&get_user, 42).await?;
/// ```
pub struct DirectCaller<Ctx> {
    make_context: ContextFactory<Ctx>,
}

impl<Ctx: Send + 'static> DirectCaller<Ctx> {
    /// Create a caller from an async context factory.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Ctx, BoxError>> + Send + 'static,
    {
        Self {
            make_context: Arc::new(move || Box::pin(factory())),
        }
    }

    /// Create a caller that hands every call a clone of `ctx`.
    pub fn with_context(ctx: Ctx) -> Self
    where
        Ctx: Clone + Sync,
    {
        Self::new(move || {
            let ctx = ctx.clone();
            async move { Ok(ctx) }
        })
    }

    /// Run a procedure, returning the error as a value.
    ///
    /// A failing context factory is classified like any other failure and
    /// stamped with the procedure name.
    pub async fn try_call<I, O>(&self, procedure: &Procedure<Ctx, I, O>, input: I) -> RpcResult<O>
    where
        I: Serialize + DeserializeOwned + Send + Sync + 'static,
        O: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let ctx = (self.make_context)().await.map_err(|e| {
            let error = RpcError::classify(e).with_procedure(procedure.name());
            debug!(procedure = %procedure.name(), code = %error.code, "Context factory failed");
            error
        })?;
        procedure.try_call(ctx, input).await
    }

    /// Run a procedure, raising the error into the caller's error type.
    pub async fn call<I, O, E>(&self, procedure: &Procedure<Ctx, I, O>, input: I) -> Result<O, E>
    where
        I: Serialize + DeserializeOwned + Send + Sync + 'static,
        O: Serialize + DeserializeOwned + Send + Sync + 'static,
        E: From<RpcError>,
    {
        self.try_call(procedure, input).await.map_err(E::from)
    }
}

impl<Ctx> Clone for DirectCaller<Ctx> {
    fn clone(&self) -> Self {
        Self {
            make_context: self.make_context.clone(),
        }
    }
}

impl<Ctx> fmt::Debug for DirectCaller<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectCaller").finish_non_exhaustive()
    }
}

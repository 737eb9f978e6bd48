//! Procedure kinds and middleware chains
//!
//! A middleware step turns the current context into the next one:
//!
//! ```rust,ignore
//! let authed = procedure.use_middleware(|ctx: Context<Request>| async move {
//!     let user = ctx.user.clone().ok_or_else(|| RpcError::unauthorized("Sign in first"))?;
//!     Ok(Session { user })
//! });
//! ```
//!
//! Steps run strictly in declaration order, one after another. Each step's
//! output is the next step's input; the last one reaches the handler.

use crate::context::Context;
use crate::error::BoxError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

/// Kind of procedure, mapped onto a transport verb.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Copy, Serialize, Deserialize)]
pub enum ProcedureType {
    /// Read-only operation, sent as GET
    #[serde(rename = "GET")]
    Query,
    /// Write operation, sent as POST
    #[serde(rename = "POST")]
    Mutation,
}

impl ProcedureType {
    /// Transport verb for this kind.
    pub fn http_method(&self) -> http::Method {
        match self {
            Self::Query => http::Method::GET,
            Self::Mutation => http::Method::POST,
        }
    }

    /// Kind served by a transport verb, if any.
    pub fn from_http_method(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(Self::Query),
            http::Method::POST => Some(Self::Mutation),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcedureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Mutation => write!(f, "mutation"),
        }
    }
}

/// Composed middleware: seed context in, handler context out.
pub(crate) type ContextChain<Seed, Ctx> =
    Arc<dyn Fn(Seed) -> BoxFuture<'static, Result<Ctx, BoxError>> + Send + Sync>;

/// Chain with no steps; the seed reaches the handler unchanged.
pub(crate) fn identity_chain<Seed: Send + 'static>() -> ContextChain<Seed, Seed> {
    Arc::new(|seed| Box::pin(async move { Ok(seed) }))
}

/// Append one step to a chain.
pub(crate) fn append_step<Seed, Ctx, Next, F, Fut>(
    previous: ContextChain<Seed, Ctx>,
    step: F,
    index: usize,
) -> ContextChain<Seed, Next>
where
    Seed: Send + 'static,
    Ctx: Send + Sync + 'static,
    Next: Send + 'static,
    F: Fn(Context<Ctx>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Next, BoxError>> + Send + 'static,
{
    let step = Arc::new(step);
    Arc::new(move |seed| {
        let previous = previous.clone();
        let step = step.clone();
        Box::pin(async move {
            let ctx = previous(seed).await?;
            trace!(step = index, "Running middleware step");
            step(Context::new(ctx)).await
        })
    })
}

//! # typed-rpc
//!
//! Typed, schema-validated remote procedures with an HTTP-style router and
//! a matching client.
//!
//! ## Overview
//!
//! - **Procedure builder**: an immutable, fluent configuration (name,
//!   schemas, middleware, error tap) frozen into a callable [`Procedure`]
//! - **Error taxonomy**: a closed set of [`RpcErrorCode`]s, each mapped to
//!   an HTTP status and a JSON-RPC code
//! - **Router**: registers procedures, dispatches GET/POST requests and
//!   encodes results or classified failures
//! - **Client**: validates input, calls through a [`Transport`], decodes
//!   and validates the response
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐        ┌───────────────────────────────────────┐
//! │ RpcClient            │        │ Router                                │
//! │  validate input      │  GET   │  name from path ─► resolve            │
//! │  build request  ─────┼──────► │  verb check ─► input extraction       │
//! │  Transport::send     │  POST  │  Procedure                            │
//! │  decode response ◄───┼─────── │   input schema ─► middleware ─►       │
//! │  validate output     │        │   handler ─► output schema            │
//! └──────────────────────┘        │  encode { result } / { error }        │
//!                                 └───────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use typed_rpc::prelude::*;
//!
//! #[derive(Clone)]
//! struct AppContext {
//!     user: Option<String>,
//! }
//!
//! let (mut router, procedure) = typed_rpc::init::<AppContext>();
//!
//! let hello = procedure
//!     .name("hello")
//!     .input(s::string().min_length(5).message("Too short"))
//!     .output(s::string())
//!     .query(|_ctx, name: String| async move { Ok(format!("hello {name}")) });
//!
//! let whoami = procedure
//!     .name("whoami")
//!     .use_middleware(|ctx: Context<AppContext>| async move {
//!         ctx.user.clone().ok_or_else(|| RpcError::unauthorized("Sign in first").into())
//!     })
//!     .output(s::string())
//!     .query(|user: Context<String>, ()| async move { Ok(user.inner().clone()) });
//!
//! router.register(hello.clone()).register(whoami);
//!
//! // Serve `router.handle(ctx, request)` from any HTTP stack, or call it
//! // in-process:
//! let router = Arc::new(router);
//! let transport = LocalTransport::new(router, |_req| AppContext { user: None });
//! let client = RpcClient::new("/", transport);
//!
//! let greeting = client.procedure(hello.contract()).try_call(&"world".into()).await?;
//! assert_eq!(greeting, "hello world");
//! ```

pub mod client;
mod config;
mod context;
mod direct;
mod error;
pub mod logging;
pub mod middleware;
pub mod procedure;
mod router;
pub mod schema;
pub mod validation;
pub mod wire;

#[cfg(test)]
mod tests;

#[cfg(feature = "http-client")]
pub use client::HttpTransport;
pub use client::{
    ClientError, ClientErrorKind, FnTransport, LocalTransport, ProcedureClient, RpcClient,
    Transport, transport_fn,
};
pub use config::{ConfigValidationError, DEFAULT_MAX_INPUT_SIZE, RouterConfig};
pub use context::{Context, EmptyContext};
pub use direct::DirectCaller;
pub use error::{
    BoxError, ErrorConfig, HTTP_STATUS_TABLE, HandlerResult, JSON_RPC_CODE_TABLE, PanicError,
    RpcError, RpcErrorCode, RpcResult, UnknownErrorCode,
};
pub use logging::RequestId;
pub use middleware::ProcedureType;
pub use procedure::{DynProcedure, ErrorTap, Procedure, ProcedureBuilder, ProcedureContract};
pub use router::{Router, RouterErrorTap};
pub use schema::{ProcedureSpec, ProcedureSpecs, Schema, SharedSchema, TypeSchema, s};
pub use validation::{Issue, PathSegment, Validate, ValidationResult, ValidationRules};
pub use wire::{FailurePayload, RouterErrorDetails, RouterResponse, SuccessPayload};

/// Create a fresh router and an empty procedure builder for the seed
/// context `Ctx`.
///
/// # Example
/// ```rust,ignore
/// let (mut router, procedure) = typed_rpc::init::<AppContext>();
/// router.register(procedure.name("ping").query(|_ctx, ()| async { Ok(()) }));
/// ```
pub fn init<Ctx>() -> (Router<Ctx>, ProcedureBuilder<Ctx>)
where
    Ctx: Send + Sync + 'static,
{
    (Router::new(), ProcedureBuilder::new())
}

/// Like [`init`], with a custom router configuration.
///
/// # Errors
///
/// Returns an error if the configuration is invalid (e.g. `max_input_size`
/// is 0).
pub fn init_with_config<Ctx>(
    config: RouterConfig,
) -> Result<(Router<Ctx>, ProcedureBuilder<Ctx>), ConfigValidationError>
where
    Ctx: Send + Sync + 'static,
{
    Ok((Router::with_config(config)?, ProcedureBuilder::new()))
}

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use typed_rpc::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, ClientError, ClientErrorKind, Context, DirectCaller, EmptyContext, ErrorConfig,
        HandlerResult, Issue, LocalTransport, Procedure, ProcedureBuilder, ProcedureContract,
        ProcedureType, Router, RouterConfig, RpcClient, RpcError, RpcErrorCode, RpcResult, Schema,
        Transport, Validate, ValidationRules, s,
    };
    pub use std::sync::Arc;
}

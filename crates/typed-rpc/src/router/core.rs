//! Router: procedure registry and request dispatch

use super::request::{extract_input, procedure_name};
use crate::config::{ConfigValidationError, RouterConfig};
use crate::error::{INTERNAL_MESSAGE, PanicError, RpcError, RpcResult, observe};
use crate::logging::{RequestId, request_span};
use crate::middleware::ProcedureType;
use crate::procedure::DynProcedure;
use crate::schema::ProcedureSpecs;
use crate::wire::{CONTENT_TYPE_JSON, RouterErrorDetails, RouterResponse};
use bytes::Bytes;
use futures::FutureExt;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, debug, trace};

/// Observational hook receiving every failure the router encodes.
pub type RouterErrorTap = Arc<dyn Fn(&RouterErrorDetails) + Send + Sync>;

/// Failure body used if a response cannot be serialized.
const FALLBACK_FAILURE_BODY: &str = r#"{"message":"Internal server error","code":-32603,"data":{"code":"INTERNAL_SERVER_ERROR","httpStatus":500,"message":"Internal server error"}}"#;

/// Registry of procedures sharing the seed context `Ctx`.
///
/// Registration is expected to finish during startup; dispatch only needs
/// `&self`, so a built router is usually shared behind an `Arc`.
///
/// # Example
/// ```rust,ignore
/// let (mut router, procedure) = typed_rpc::init::<AppContext>();
///
/// router
///     .register(procedure.name("health").query(|_ctx, ()| async { Ok(()) }))
///     .register(users::create(&procedure));
///
/// let response = router.handle(AppContext::from(&request), request).await;
/// ```
pub struct Router<Ctx> {
    procedures: HashMap<String, Arc<dyn DynProcedure<Ctx>>>,
    config: RouterConfig,
    tap: Option<RouterErrorTap>,
}

impl<Ctx: Send + 'static> Router<Ctx> {
    /// Create an empty router with the default configuration.
    pub fn new() -> Self {
        Self {
            procedures: HashMap::new(),
            config: RouterConfig::default(),
            tap: None,
        }
    }

    /// Create an empty router with a validated configuration.
    pub fn with_config(config: RouterConfig) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        Ok(Self {
            procedures: HashMap::new(),
            config,
            tap: None,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Register a procedure under its name. A procedure already registered
    /// under the same name is replaced.
    pub fn register<P>(&mut self, procedure: P) -> &mut Self
    where
        P: DynProcedure<Ctx> + 'static,
    {
        let name = procedure.name().to_string();
        debug!(
            procedure = %name,
            procedure_type = %procedure.procedure_type(),
            mocked = procedure.mocked(),
            "Registering procedure"
        );
        if self.procedures.insert(name.clone(), Arc::new(procedure)).is_some() {
            debug!(procedure = %name, "Replaced previously registered procedure");
        }
        self
    }

    /// Observe every failure response. Panics inside the tap are swallowed.
    pub fn tap_on_error<F>(&mut self, tap: F) -> &mut Self
    where
        F: Fn(&RouterErrorDetails) + Send + Sync + 'static,
    {
        self.tap = Some(Arc::new(tap));
        self
    }

    /// Look up a procedure by name.
    pub fn resolve(&self, name: &str) -> RpcResult<Arc<dyn DynProcedure<Ctx>>> {
        self.procedures.get(name).cloned().ok_or_else(|| {
            debug!(procedure = %name, "Procedure not found");
            RpcError::not_found("Procedure not found!").with_procedure(name)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// List all registered procedure names, sorted.
    pub fn procedures(&self) -> Vec<String> {
        let mut names: Vec<_> = self.procedures.keys().cloned().collect();
        names.sort();
        names
    }

    /// Describe every registered procedure, sorted by name.
    pub fn specs(&self) -> ProcedureSpecs {
        let mut procedures: Vec<_> = self.procedures.values().map(|p| p.spec()).collect();
        procedures.sort_by(|a, b| a.name.cmp(&b.name));
        ProcedureSpecs { procedures }
    }

    /// Call a procedure by name without going through a request.
    pub async fn call(&self, name: &str, ctx: Ctx, input: Value) -> RpcResult<Value> {
        let procedure = self.resolve(name)?;
        run(procedure, ctx, input).await
    }

    /// Serve a request, reading the procedure name from the URI path below
    /// the configured mount prefix.
    pub async fn handle(&self, ctx: Ctx, request: Request<Bytes>) -> Response<Bytes> {
        let path = request.uri().path().to_string();
        match self.config.strip_prefix(&path) {
            Some(pathname) => self.process(pathname, ctx, request).await,
            None => {
                debug!(path = %path, prefix = %self.config.mount_prefix, "Path outside mount prefix");
                let error = RpcError::not_found("Procedure not found!").with_procedure(path.as_str());
                self.respond(Err(error))
            }
        }
    }

    /// Serve a request for the procedure named by `pathname`.
    pub async fn process(&self, pathname: &str, ctx: Ctx, request: Request<Bytes>) -> Response<Bytes> {
        let request_id = RequestId::new();
        let name = procedure_name(pathname);
        let span = request_span(&request_id, request.method());
        span.record("procedure", name);

        async move {
            trace!("Dispatching request");
            let outcome = self.dispatch(name, ctx, &request).await;
            self.respond(outcome)
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, name: &str, ctx: Ctx, request: &Request<Bytes>) -> RpcResult<Value> {
        let procedure = self.resolve(name)?;

        let declared = procedure.procedure_type();
        if ProcedureType::from_http_method(request.method()) != Some(declared) {
            debug!(declared = %declared, "Method mismatch");
            return Err(RpcError::method_not_supported(format!(
                "Method {} not supported for procedure {}",
                request.method(),
                name
            ))
            .with_procedure(name));
        }

        let input = extract_input(request, declared, self.config.max_input_size)
            .map_err(|e| e.with_procedure(name))?;
        run(procedure, ctx, input).await
    }

    fn respond(&self, outcome: RpcResult<Value>) -> Response<Bytes> {
        match outcome {
            Ok(data) => {
                trace!("Request succeeded");
                json_response(StatusCode::OK, &RouterResponse::success(data))
            }
            Err(error) => {
                let details = RouterErrorDetails::from_error(&error, &self.config.error);
                debug!(code = %details.code, status = details.http_status, "Request failed");
                if let Some(tap) = &self.tap {
                    observe(tap.as_ref(), &details);
                }
                let status = StatusCode::from_u16(details.http_status)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                json_response(status, &RouterResponse::failure(details))
            }
        }
    }
}

impl<Ctx: Send + 'static> Default for Router<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> fmt::Debug for Router<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.procedures.keys().collect();
        names.sort();
        f.debug_struct("Router")
            .field("procedures", &names)
            .field("config", &self.config)
            .field("has_tap", &self.tap.is_some())
            .finish()
    }
}

/// Run a procedure, turning an escaped panic into an internal error.
async fn run<Ctx>(procedure: Arc<dyn DynProcedure<Ctx>>, ctx: Ctx, input: Value) -> RpcResult<Value> {
    let name = procedure.name().to_string();
    match AssertUnwindSafe(procedure.call_value(ctx, input)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let panic = PanicError::from_payload(payload);
            debug!(procedure = %name, error = %panic, "Procedure panicked");
            Err(RpcError::internal(INTERNAL_MESSAGE)
                .with_cause(panic)
                .capture_stack_trace()
                .with_procedure(name))
        }
    }
}

fn json_response(status: StatusCode, body: &RouterResponse) -> Response<Bytes> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, Bytes::from(bytes)),
        Err(e) => {
            debug!(error = %e, "Failed to serialize response body");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(FALLBACK_FAILURE_BODY.as_bytes()),
            )
        }
    };
    let mut response = Response::new(bytes);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    response
}

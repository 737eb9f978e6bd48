//! Execution pipeline behind a built procedure
//!
//! Order for real procedures:
//! 1. validate input (`PARSE_ERROR` on failure, before any middleware)
//! 2. run middleware steps in declaration order
//! 3. run the handler, classify its failure, notify the error tap
//! 4. validate output (`PARSE_ERROR` carrying the validated input)
//!
//! Mocked procedures deserialize the input and call the handler directly.

use super::contract::ProcedureContract;
use crate::context::Context;
use crate::error::{HandlerResult, INTERNAL_MESSAGE, PanicError, RpcError, RpcResult, observe};
use crate::middleware::ContextChain;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, trace};

pub(crate) const INPUT_PARSE_MESSAGE: &str = "Error parsing input";
pub(crate) const OUTPUT_PARSE_MESSAGE: &str = "Error parsing output";

/// Boxed handler for type erasure
pub(crate) type BoxedHandler<Ctx, I, O> =
    Arc<dyn Fn(Context<Ctx>, I) -> BoxFuture<'static, HandlerResult<O>> + Send + Sync>;

/// Boxed handler of a mocked procedure.
pub(crate) type BoxedMockHandler<I, O> =
    Arc<dyn Fn(I) -> BoxFuture<'static, HandlerResult<O>> + Send + Sync>;

/// Observational hook receiving classified handler failures.
pub type ErrorTap = Arc<dyn Fn(&RpcError) + Send + Sync>;

/// Runs a procedure from a seed context and raw input.
pub(crate) trait Invoke<Seed, I, O>: Send + Sync {
    fn invoke(self: Arc<Self>, seed: Seed, raw: Value) -> BoxFuture<'static, RpcResult<O>>;

    fn mocked(&self) -> bool {
        false
    }
}

pub(crate) struct Pipeline<Seed, Ctx: Send + Sync + 'static, I, O> {
    pub(crate) contract: ProcedureContract<I, O>,
    pub(crate) chain: ContextChain<Seed, Ctx>,
    pub(crate) middleware_count: usize,
    pub(crate) handler: BoxedHandler<Ctx, I, O>,
    pub(crate) tap: Option<ErrorTap>,
}

impl<Seed, Ctx: Send + Sync + 'static, I, O> Pipeline<Seed, Ctx, I, O> {
    fn report(&self, error: &RpcError) {
        if let Some(tap) = &self.tap {
            observe(tap.as_ref(), error);
        }
    }
}

/// Turn a handler or middleware outcome (including a caught panic) into a
/// value or a classified error.
fn classify_outcome<O>(
    outcome: Result<HandlerResult<O>, Box<dyn std::any::Any + Send>>,
) -> Result<O, RpcError> {
    match outcome {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(error)) => Err(RpcError::from_boxed(error)),
        Err(payload) => {
            let panic = PanicError::from_payload(payload);
            debug!(error = %panic, "Procedure step panicked");
            Err(RpcError::internal(INTERNAL_MESSAGE)
                .with_cause(panic)
                .capture_stack_trace())
        }
    }
}

impl<Seed, Ctx, I, O> Invoke<Seed, I, O> for Pipeline<Seed, Ctx, I, O>
where
    Seed: Send + 'static,
    Ctx: Send + Sync + 'static,
    I: Serialize + DeserializeOwned + Send + Sync + 'static,
    O: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn invoke(self: Arc<Self>, seed: Seed, raw: Value) -> BoxFuture<'static, RpcResult<O>> {
        Box::pin(async move {
            let name = self.contract.name();

            let input = self.contract.input_schema().parse(&raw).map_err(|issues| {
                debug!(procedure = %name, issue_count = issues.len(), "Input validation failed");
                RpcError::parse(INPUT_PARSE_MESSAGE)
                    .with_issues(issues)
                    .with_procedure(name)
            })?;
            let validated_input = serde_json::to_value(&input).ok();
            trace!(procedure = %name, "Input validated");

            let chained = AssertUnwindSafe((self.chain)(seed)).catch_unwind().await;
            let ctx = classify_outcome(chained).map_err(|error| {
                let error = error.stamped(name, validated_input.clone());
                debug!(
                    procedure = %name,
                    code = %error.code,
                    steps = self.middleware_count,
                    "Middleware rejected request"
                );
                error
            })?;

            trace!(procedure = %name, "Invoking handler");
            let handler = self.handler.clone();
            let outcome = AssertUnwindSafe(async move { handler(Context::new(ctx), input).await })
                .catch_unwind()
                .await;
            let output = match classify_outcome(outcome) {
                Ok(output) => output,
                Err(error) => {
                    let error = error.stamped(name, validated_input);
                    debug!(procedure = %name, code = %error.code, "Handler failed");
                    self.report(&error);
                    return Err(error);
                }
            };

            let output_value = serde_json::to_value(&output).map_err(|e| {
                RpcError::internal(INTERNAL_MESSAGE)
                    .with_cause(e)
                    .stamped(name, validated_input.clone())
            })?;
            let output = self.contract.output_schema().parse(&output_value).map_err(|issues| {
                debug!(procedure = %name, issue_count = issues.len(), "Output validation failed");
                RpcError::parse(OUTPUT_PARSE_MESSAGE)
                    .with_issues(issues)
                    .stamped(name, validated_input.clone())
            })?;
            trace!(procedure = %name, "Output validated");

            Ok(output)
        })
    }
}

pub(crate) struct MockPipeline<I, O> {
    pub(crate) contract: ProcedureContract<I, O>,
    pub(crate) handler: BoxedMockHandler<I, O>,
}

impl<Seed, I, O> Invoke<Seed, I, O> for MockPipeline<I, O>
where
    Seed: Send + 'static,
    I: Serialize + DeserializeOwned + Send + Sync + 'static,
    O: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn invoke(self: Arc<Self>, _seed: Seed, raw: Value) -> BoxFuture<'static, RpcResult<O>> {
        Box::pin(async move {
            let name = self.contract.name();
            let input: I = serde_json::from_value(raw).map_err(|e| {
                RpcError::parse(INPUT_PARSE_MESSAGE)
                    .with_cause(e)
                    .with_procedure(name)
            })?;
            trace!(procedure = %name, "Invoking mocked handler");

            let handler = self.handler.clone();
            let outcome = AssertUnwindSafe(async move { handler(input).await })
                .catch_unwind()
                .await;
            classify_outcome(outcome).map_err(|error| error.with_procedure(name))
        })
    }

    fn mocked(&self) -> bool {
        true
    }
}

/// Box a handler for storage.
pub(crate) fn into_boxed<Ctx, I, O, H, Fut>(handler: H) -> BoxedHandler<Ctx, I, O>
where
    Ctx: Send + Sync + 'static,
    H: Fn(Context<Ctx>, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<O>> + Send + 'static,
{
    Arc::new(move |ctx, input| Box::pin(handler(ctx, input)))
}

/// Box a mock handler for storage.
pub(crate) fn into_boxed_mock<I, O, H, Fut>(handler: H) -> BoxedMockHandler<I, O>
where
    H: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<O>> + Send + 'static,
{
    Arc::new(move |input| Box::pin(handler(input)))
}

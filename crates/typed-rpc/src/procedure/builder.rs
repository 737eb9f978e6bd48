//! Immutable procedure builder

use super::callable::Procedure;
use super::contract::ProcedureContract;
use super::pipeline::{ErrorTap, MockPipeline, Pipeline, into_boxed, into_boxed_mock};
use crate::context::Context;
use crate::error::{BoxError, HandlerResult, RpcError};
use crate::middleware::{ContextChain, ProcedureType, append_step, identity_chain};
use crate::schema::{Schema, SharedSchema, s};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Fluent, immutable procedure configuration.
///
/// Every setter takes `&self` and returns a new builder, so a shared prefix
/// can be branched freely:
///
/// ```rust,ignore
/// let (mut router, procedure) = typed_rpc::init::<Request>();
/// let authed = procedure.use_middleware(require_user);
///
/// let me = authed.name("me").output(s::typed::<User>()).query(me_handler);
/// let logout = authed.name("logout").mutation(logout_handler);
/// let health = procedure.name("health").query(|_ctx, ()| async { Ok(()) });
/// ```
///
/// `Seed` is the context supplied by the caller; `Ctx` is the context after
/// all middleware, which the handler receives. `I` and `O` follow from the
/// input and output schemas (both default to `null`, i.e. `()`).
pub struct ProcedureBuilder<Seed, Ctx = Seed, I = (), O = ()> {
    name: Option<Arc<str>>,
    input: SharedSchema<I>,
    output: SharedSchema<O>,
    chain: ContextChain<Seed, Ctx>,
    middleware_count: usize,
    tap: Option<ErrorTap>,
}

impl<Seed: Send + Sync + 'static> ProcedureBuilder<Seed> {
    /// Create an unnamed builder with no middleware and `null` schemas.
    pub fn new() -> Self {
        Self {
            name: None,
            input: Arc::new(s::null()),
            output: Arc::new(s::null()),
            chain: identity_chain(),
            middleware_count: 0,
            tap: None,
        }
    }
}

impl<Seed: Send + Sync + 'static> Default for ProcedureBuilder<Seed> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Seed, Ctx, I, O> Clone for ProcedureBuilder<Seed, Ctx, I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            chain: self.chain.clone(),
            middleware_count: self.middleware_count,
            tap: self.tap.clone(),
        }
    }
}

impl<Seed, Ctx, I, O> fmt::Debug for ProcedureBuilder<Seed, Ctx, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureBuilder")
            .field("name", &self.name)
            .field("middleware_count", &self.middleware_count)
            .field("has_tap", &self.tap.is_some())
            .finish()
    }
}

impl<Seed, Ctx, I, O> ProcedureBuilder<Seed, Ctx, I, O>
where
    Seed: Send + Sync + 'static,
    Ctx: Send + Sync + 'static,
    I: Serialize + DeserializeOwned + Send + Sync + 'static,
    O: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Set the procedure name.
    #[must_use = "This method returns a new ProcedureBuilder and does not modify self"]
    pub fn name(&self, name: impl Into<String>) -> Self {
        Self {
            name: Some(Arc::from(name.into())),
            ..self.clone()
        }
    }

    /// Set the input schema; the handler receives its output type.
    #[must_use = "This method returns a new ProcedureBuilder and does not modify self"]
    pub fn input<S: Schema>(&self, schema: S) -> ProcedureBuilder<Seed, Ctx, S::Output, O> {
        ProcedureBuilder {
            name: self.name.clone(),
            input: Arc::new(schema),
            output: self.output.clone(),
            chain: self.chain.clone(),
            middleware_count: self.middleware_count,
            tap: self.tap.clone(),
        }
    }

    /// Set the output schema; the handler must return its output type.
    #[must_use = "This method returns a new ProcedureBuilder and does not modify self"]
    pub fn output<S: Schema>(&self, schema: S) -> ProcedureBuilder<Seed, Ctx, I, S::Output> {
        ProcedureBuilder {
            name: self.name.clone(),
            input: self.input.clone(),
            output: Arc::new(schema),
            chain: self.chain.clone(),
            middleware_count: self.middleware_count,
            tap: self.tap.clone(),
        }
    }

    /// Append a middleware step transforming the context.
    ///
    /// Steps run after input validation, in the order they were added. A
    /// step that returns an error aborts the call before the handler runs.
    #[must_use = "This method returns a new ProcedureBuilder and does not modify self"]
    pub fn use_middleware<F, Fut, Next>(&self, step: F) -> ProcedureBuilder<Seed, Next, I, O>
    where
        F: Fn(Context<Ctx>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Next, BoxError>> + Send + 'static,
        Next: Send + Sync + 'static,
    {
        ProcedureBuilder {
            name: self.name.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            chain: append_step(self.chain.clone(), step, self.middleware_count),
            middleware_count: self.middleware_count + 1,
            tap: self.tap.clone(),
        }
    }

    /// Observe classified handler failures. Panics inside the tap are
    /// swallowed.
    #[must_use = "This method returns a new ProcedureBuilder and does not modify self"]
    pub fn tap_on_error<F>(&self, tap: F) -> Self
    where
        F: Fn(&RpcError) + Send + Sync + 'static,
    {
        Self {
            tap: Some(Arc::new(tap)),
            ..self.clone()
        }
    }

    /// Freeze into a query (GET) procedure.
    ///
    /// # Panics
    ///
    /// Panics if no name was set.
    pub fn query<H, Fut>(&self, handler: H) -> Procedure<Seed, I, O>
    where
        H: Fn(Context<Ctx>, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<O>> + Send + 'static,
    {
        self.build(ProcedureType::Query, handler)
    }

    /// Freeze into a mutation (POST) procedure.
    ///
    /// # Panics
    ///
    /// Panics if no name was set.
    pub fn mutation<H, Fut>(&self, handler: H) -> Procedure<Seed, I, O>
    where
        H: Fn(Context<Ctx>, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<O>> + Send + 'static,
    {
        self.build(ProcedureType::Mutation, handler)
    }

    /// Freeze into a stub that skips validation and middleware and just
    /// calls `handler(input)`.
    ///
    /// # Panics
    ///
    /// Panics if no name was set.
    pub fn mock<H, Fut>(&self, handler: H, procedure_type: ProcedureType) -> Procedure<Seed, I, O>
    where
        H: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<O>> + Send + 'static,
    {
        let contract = self.freeze_contract(procedure_type, "mock");
        debug!(procedure = %contract.name(), "Built mocked procedure");
        let pipeline = MockPipeline {
            contract: contract.clone(),
            handler: into_boxed_mock(handler),
        };
        Procedure::new(contract, Arc::new(pipeline))
    }

    /// Handler-less query contract for clients.
    ///
    /// # Panics
    ///
    /// Panics if no name was set.
    pub fn contract_query(&self) -> ProcedureContract<I, O> {
        self.freeze_contract(ProcedureType::Query, "contract_query")
    }

    /// Handler-less mutation contract for clients.
    ///
    /// # Panics
    ///
    /// Panics if no name was set.
    pub fn contract_mutation(&self) -> ProcedureContract<I, O> {
        self.freeze_contract(ProcedureType::Mutation, "contract_mutation")
    }

    fn freeze_contract(&self, procedure_type: ProcedureType, op: &str) -> ProcedureContract<I, O> {
        let name = match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => panic!("procedure name must be set before calling `{op}`; call `.name(..)` first"),
        };
        ProcedureContract::new(
            name,
            procedure_type,
            self.input.clone(),
            self.output.clone(),
        )
    }

    fn build<H, Fut>(&self, procedure_type: ProcedureType, handler: H) -> Procedure<Seed, I, O>
    where
        H: Fn(Context<Ctx>, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<O>> + Send + 'static,
    {
        let op = match procedure_type {
            ProcedureType::Query => "query",
            ProcedureType::Mutation => "mutation",
        };
        let contract = self.freeze_contract(procedure_type, op);
        debug!(
            procedure = %contract.name(),
            procedure_type = %procedure_type,
            middleware = self.middleware_count,
            "Built procedure"
        );
        let pipeline = Pipeline {
            contract: contract.clone(),
            chain: self.chain.clone(),
            middleware_count: self.middleware_count,
            handler: into_boxed(handler),
            tap: self.tap.clone(),
        };
        Procedure::new(contract, Arc::new(pipeline))
    }
}

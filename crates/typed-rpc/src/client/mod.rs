//! Client pipeline
//!
//! A [`RpcClient`] turns procedure contracts into typed callers. Each call:
//!
//! 1. validates the input locally (no request is sent on failure)
//! 2. builds a GET (input in the `input` query parameter) or POST (input as
//!    body) request to `{base_url}/{name}`
//! 3. sends it through the [`Transport`]
//! 4. decodes the body, surfacing server failures as [`ClientError::Rpc`]
//! 5. validates the output locally
//!
//! ```rust,ignore
//! let client = RpcClient::new("https://api.example.com/rpc", HttpTransport::new());
//! let hello = client.procedure(&contracts::hello());
//!
//! match hello.try_call(&"world".to_string()).await {
//!     Ok(greeting) => println!("{greeting}"),
//!     Err(e) => eprintln!("{}: {e}", e.kind()),
//! }
//! ```

mod error;
mod transport;

pub use error::{ClientError, ClientErrorKind};
#[cfg(feature = "http-client")]
pub use transport::HttpTransport;
pub use transport::{FnTransport, LocalTransport, Transport, transport_fn};

use crate::error::BoxError;
use crate::middleware::ProcedureType;
use crate::procedure::ProcedureContract;
use crate::validation::Issue;
use crate::wire::{CONTENT_TYPE_JSON, INPUT_QUERY_PARAM, RouterResponse};
use bytes::Bytes;
use http::Request;
use http::header::{ACCEPT, CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Entry point for calling procedures through a transport.
#[derive(Clone)]
pub struct RpcClient {
    base_url: Arc<str>,
    transport: Arc<dyn Transport>,
}

impl RpcClient {
    /// Create a client. Trailing slashes of `base_url` are ignored.
    pub fn new(base_url: impl Into<String>, transport: impl Transport + 'static) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            transport: Arc::new(transport),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Typed caller for one procedure contract.
    pub fn procedure<I, O>(&self, contract: &ProcedureContract<I, O>) -> ProcedureClient<I, O> {
        ProcedureClient {
            client: self.clone(),
            contract: contract.clone(),
        }
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Typed caller bound to a single procedure contract.
pub struct ProcedureClient<I, O> {
    client: RpcClient,
    contract: ProcedureContract<I, O>,
}

impl<I, O> ProcedureClient<I, O>
where
    I: Serialize + DeserializeOwned + Send + Sync + 'static,
    O: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn contract(&self) -> &ProcedureContract<I, O> {
        &self.contract
    }

    /// Call the procedure, returning failures as values.
    pub async fn try_call(&self, input: &I) -> Result<O, ClientError> {
        let name = self.contract.name();

        let input = serde_json::to_value(input)
            .map_err(|e| self.validation(Value::Null, None, vec![Issue::custom(e.to_string())]))?;
        // Checked only; the caller's value goes on the wire unchanged.
        self.contract.input_schema().parse(&input).map_err(|issues| {
            debug!(procedure = %name, issue_count = issues.len(), "Input rejected locally");
            self.validation(input.clone(), None, issues)
        })?;

        let request = self
            .build_request(&input)
            .map_err(|cause| self.fetch_error(&input, cause))?;
        trace!(procedure = %name, method = %request.method(), uri = %request.uri(), "Sending request");

        let response = self
            .client
            .transport
            .send(request)
            .await
            .map_err(|cause| self.fetch_error(&input, cause))?;

        let decoded: RouterResponse = serde_json::from_slice(response.body()).map_err(|e| {
            debug!(procedure = %name, status = %response.status(), error = %e, "Undecodable response");
            ClientError::Parse {
                procedure: name.to_string(),
                input: input.clone(),
                cause: Box::new(e),
            }
        })?;

        let data = match decoded {
            RouterResponse::Success { result } => result.data,
            RouterResponse::Failure(payload) => {
                debug!(procedure = %name, code = %payload.data.code, "Server reported failure");
                return Err(ClientError::Rpc {
                    procedure: name.to_string(),
                    input,
                    json_rpc_code: payload.code,
                    error: payload.data,
                });
            }
        };

        self.contract.output_schema().parse(&data).map_err(|issues| {
            debug!(procedure = %name, issue_count = issues.len(), "Output rejected locally");
            self.validation(input, Some(data.clone()), issues)
        })
    }

    /// Call the procedure, raising failures into the caller's error type.
    pub async fn call<E>(&self, input: &I) -> Result<O, E>
    where
        E: From<ClientError>,
    {
        self.try_call(input).await.map_err(E::from)
    }

    fn build_request(&self, input: &Value) -> Result<Request<Bytes>, BoxError> {
        let encoded = serde_json::to_string(input)?;
        let url = format!("{}/{}", self.client.base_url, self.contract.name());
        let kind = self.contract.procedure_type();

        let (uri, body) = match kind {
            ProcedureType::Query => (
                format!("{url}?{INPUT_QUERY_PARAM}={}", urlencoding::encode(&encoded)),
                Bytes::new(),
            ),
            ProcedureType::Mutation => (url, Bytes::from(encoded)),
        };

        let request = Request::builder()
            .method(kind.http_method())
            .uri(uri)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(ACCEPT, CONTENT_TYPE_JSON)
            .body(body)?;
        Ok(request)
    }

    fn validation(&self, input: Value, output: Option<Value>, issues: Vec<Issue>) -> ClientError {
        ClientError::Validation {
            procedure: self.contract.name().to_string(),
            input,
            output,
            issues,
        }
    }

    fn fetch_error(&self, input: &Value, cause: BoxError) -> ClientError {
        debug!(procedure = %self.contract.name(), error = %cause, "Transport failed");
        ClientError::Fetch {
            procedure: self.contract.name().to_string(),
            input: input.clone(),
            cause,
        }
    }
}

impl<I, O> Clone for ProcedureClient<I, O> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            contract: self.contract.clone(),
        }
    }
}

impl<I, O> fmt::Debug for ProcedureClient<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureClient")
            .field("base_url", &self.client.base_url)
            .field("procedure", &self.contract.name())
            .finish()
    }
}

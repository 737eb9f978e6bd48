//! Transports carrying client requests to a router

use crate::error::BoxError;
use crate::router::Router;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

/// Sends one request and yields its response.
///
/// Any failure to obtain a response (network error, refused connection)
/// is returned as an error; error statuses are ordinary responses.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, BoxError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, BoxError>> {
        (**self).send(request)
    }
}

/// Transport backed by an async function.
pub struct FnTransport<F> {
    f: F,
}

/// Wrap an async function as a [`Transport`].
///
/// ```rust,ignore
/// let offline = transport_fn(|_req| async { Err::<Response<Bytes>, BoxError>("offline".into()) });
/// ```
pub fn transport_fn<F, Fut>(f: F) -> FnTransport<F>
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
{
    FnTransport { f }
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
{
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, BoxError>> {
        Box::pin((self.f)(request))
    }
}

/// In-process transport handing requests straight to a [`Router`].
///
/// The context factory builds the seed context from each request, the way
/// a server adapter would.
pub struct LocalTransport<Ctx> {
    router: Arc<Router<Ctx>>,
    make_context: Arc<dyn Fn(&Request<Bytes>) -> Ctx + Send + Sync>,
}

impl<Ctx: Send + 'static> LocalTransport<Ctx> {
    pub fn new<F>(router: Arc<Router<Ctx>>, make_context: F) -> Self
    where
        F: Fn(&Request<Bytes>) -> Ctx + Send + Sync + 'static,
    {
        Self {
            router,
            make_context: Arc::new(make_context),
        }
    }

    pub fn router(&self) -> &Arc<Router<Ctx>> {
        &self.router
    }
}

impl<Ctx> Clone for LocalTransport<Ctx> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
            make_context: self.make_context.clone(),
        }
    }
}

impl<Ctx: Send + 'static> Transport for LocalTransport<Ctx> {
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, BoxError>> {
        Box::pin(async move {
            trace!(method = %request.method(), uri = %request.uri(), "Local dispatch");
            let ctx = (self.make_context)(&request);
            Ok(self.router.handle(ctx, request).await)
        })
    }
}

/// Transport sending requests over HTTP with `reqwest`.
#[cfg(feature = "http-client")]
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http-client")]
impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, default headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http-client")]
impl Transport for HttpTransport {
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, BoxError>> {
        Box::pin(async move {
            let request = reqwest::Request::try_from(request)?;
            trace!(method = %request.method(), url = %request.url(), "HTTP dispatch");
            let response = self.client.execute(request).await?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;

            let mut converted = Response::new(body);
            *converted.status_mut() = status;
            *converted.headers_mut() = headers;
            Ok(converted)
        })
    }
}

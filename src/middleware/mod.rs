//! Middleware layer.
//!
//! A middleware wraps "the rest of the pipeline" and is the place for
//! cross-cutting concerns: request logging, method override, anti-forgery
//! checks, session loading.
//!
//! Chains use onion ordering. The first middleware added is the outermost:
//! it sees the request before every other layer and sees the response after
//! every other layer has returned.
//!
//! ```text
//! chain [M1, M2] around T
//!
//!   request ──▶ M1 ──▶ M2 ──▶ T
//!   response ◀── M1 ◀── M2 ◀──┘
//! ```
//!
//! Built-in middleware:
//! - [`Trace`] — per-request span with method, path, status, latency
//! - [`MethodOverride`] — lets HTML forms issue `PUT` / `PATCH` / `DELETE`

mod method_override;
mod trace;

use std::future::Future;
use std::sync::Arc;

pub use method_override::MethodOverride;
pub use trace::Trace;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A handler-wrapping behaviour.
///
/// Implemented automatically for closures of the shape
/// `Fn(Request, Next) -> impl Future<Output = impl IntoResponse>`:
///
/// ```rust
/// use trellis::middleware::{MiddlewareChain, Next};
/// use trellis::Request;
///
/// let chain = MiddlewareChain::new().with(|req: Request, next: Next| async move {
///     let mut res = next.run(req).await;
///     res.headers_mut().insert("x-frame-options", "DENY".parse().unwrap());
///     res
/// });
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let fut = self(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// The remainder of the pipeline, handed to each [`Middleware`].
#[derive(Clone)]
pub struct Next {
    inner: BoxedHandler,
}

impl Next {
    /// Runs every inner layer and the handler, returning their response.
    pub async fn run(self, req: Request) -> Response {
        self.inner.call(req).await
    }
}

/// An ordered list of middleware. Assembled at startup, immutable once a
/// router is built from it.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware` as the innermost layer so far.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.push(middleware);
        self
    }

    pub fn push(&mut self, middleware: impl Middleware) {
        self.layers.push(Arc::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Composes the chain around `terminal`.
    pub fn wrap(&self, terminal: impl Handler) -> Pipeline {
        Pipeline(self.wrap_boxed(terminal.into_boxed_handler()))
    }

    /// Folds from the last layer outward so the first one ends up outermost.
    /// An empty chain returns `terminal` itself.
    pub(crate) fn wrap_boxed(&self, terminal: BoxedHandler) -> BoxedHandler {
        self.layers.iter().rev().fold(terminal, |next, middleware| {
            Arc::new(Layered { middleware: Arc::clone(middleware), next })
        })
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain").field("layers", &self.layers.len()).finish()
    }
}

/// A handler with its middleware already composed around it.
#[derive(Clone)]
pub struct Pipeline(BoxedHandler);

impl Pipeline {
    pub async fn call(&self, req: impl Into<Request>) -> Response {
        self.0.call(req.into()).await
    }

    pub(crate) fn into_boxed(self) -> BoxedHandler {
        self.0
    }
}

struct Layered {
    middleware: Arc<dyn Middleware>,
    next: BoxedHandler,
}

impl ErasedHandler for Layered {
    fn call(&self, req: Request) -> BoxFuture {
        self.middleware.call(req, Next { inner: Arc::clone(&self.next) })
    }
}

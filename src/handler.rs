//! Handler trait and type erasure.
//!
//! Routes, middleware layers and the not-found fallback all end up as the
//! same thing: an [`ErasedHandler`] behind an `Arc`. That is what lets the
//! router keep routes with different handler types in one `Vec`, and what
//! lets a middleware layer wrap "whatever comes next" without knowing its
//! concrete type.
//!
//! Three kinds of value are handlers:
//!
//! ```text
//! async fn show(req: Request) -> impl IntoResponse   boxed once, on registration
//! App (a built Router)                               already boxed, shared as is
//! Pipeline (a MiddlewareChain around a handler)      already boxed, shared as is
//! ```
//!
//! The last two let a whole sub-application, or a handler with its own
//! middleware, be mounted behind a single route.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::middleware::Pipeline;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::App;

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by [`App`],
/// [`Pipeline`], and any `async fn` (or closure returning a future) with the
/// signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    use super::*;

    pub trait Sealed {}

    /// `Fn(Request) -> impl Future<Output = impl IntoResponse>`, spelled once.
    pub trait AsyncFn: Send + Sync + 'static {
        type Output: IntoResponse + Send + 'static;
        type Future: Future<Output = Self::Output> + Send + 'static;

        fn invoke(&self, req: Request) -> Self::Future;
    }

    impl<F, Fut> AsyncFn for F
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResponse + Send + 'static,
    {
        type Output = Fut::Output;
        type Future = Fut;

        fn invoke(&self, req: Request) -> Fut {
            self(req)
        }
    }

    impl<F: AsyncFn> Sealed for F {}
    impl Sealed for App {}
    impl Sealed for Pipeline {}
}

use private::AsyncFn;

impl<F: AsyncFn> Handler for F {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

impl Handler for App {
    fn into_boxed_handler(self) -> BoxedHandler {
        self.into_boxed()
    }
}

impl Handler for Pipeline {
    fn into_boxed_handler(self) -> BoxedHandler {
        self.into_boxed()
    }
}

struct FnHandler<F>(F);

impl<F: AsyncFn> ErasedHandler for FnHandler<F> {
    fn call(&self, req: Request) -> BoxFuture {
        let fut = self.0.invoke(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

//! Ordered, first-match-wins request router.
//!
//! Routes are tried in the order they were registered. The first route whose
//! checks all pass handles the request and the search stops there, even if a
//! later route would also match. No route matching is not an error: the
//! request goes to the not-found handler.
//!
//! The router has two states, and each is its own type:
//!
//! - [`Router`] accepts registrations. It is consumed by [`Router::build`].
//! - [`App`] serves requests. It is immutable and cheap to clone, so it can
//!   be shared by every connection task without locking. Because the
//!   `Router` is gone by then, nothing can register a route while serving.

use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::request::Request;
use crate::response::Response;
use crate::route::{Route, SelectedRoute};

/// The application router, in its registration state.
///
/// Each call returns `self` so registrations chain naturally. Build it once
/// at startup; pass it (or the [`App`] it builds) to
/// [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: Vec<Route>,
    middleware: MiddlewareChain,
    not_found: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            middleware: MiddlewareChain::new(),
            not_found: default_not_found.into_boxed_handler(),
        }
    }

    /// Appends a fully assembled [`Route`].
    ///
    /// Logs a warning when an earlier route has no checks: it accepts every
    /// request, so this one can never be selected.
    pub fn route(mut self, route: Route) -> Self {
        if let Some(catch_all) = self.routes.iter().find(|r| r.is_catch_all()) {
            warn!(
                route = route.label(),
                shadowed_by = catch_all.label(),
                position = self.routes.len(),
                "route is registered after a catch-all route and will never be selected",
            );
        }
        debug!(route = route.label(), "route registered");
        self.routes.push(route);
        self
    }

    /// Register a handler for a method + pattern pair.
    ///
    /// Pattern variables use `{name}` syntax; `req.param("name")` retrieves
    /// them:
    ///
    /// ```rust,no_run
    /// # use trellis::{Method, Request, Response, Router};
    /// # async fn show_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", show_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is malformed. Routes are registered at startup,
    /// where a bad pattern is a programming error; use [`Router::try_on`] to
    /// handle it instead.
    pub fn on(self, method: Method, pattern: &str, handler: impl Handler) -> Self {
        self.try_on(method, pattern, handler)
            .unwrap_or_else(|e| panic!("invalid route: {e}"))
    }

    /// Like [`Router::on`], returning malformed patterns as an error.
    pub fn try_on(self, method: Method, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        Ok(self.route(Route::at(method, pattern, handler)?))
    }

    /// Like [`Router::on`], wrapping this route's handler in `layers`.
    pub fn on_with(
        self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
        layers: MiddlewareChain,
    ) -> Self {
        match Route::at(method, pattern, handler) {
            Ok(route) => self.route(route.layers(layers)),
            Err(e) => panic!("invalid route: {e}"),
        }
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, pattern, handler)
    }

    pub fn patch(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, pattern, handler)
    }

    pub fn get_with(self, pattern: &str, handler: impl Handler, layers: MiddlewareChain) -> Self {
        self.on_with(Method::GET, pattern, handler, layers)
    }

    pub fn post_with(self, pattern: &str, handler: impl Handler, layers: MiddlewareChain) -> Self {
        self.on_with(Method::POST, pattern, handler, layers)
    }

    pub fn delete_with(self, pattern: &str, handler: impl Handler, layers: MiddlewareChain) -> Self {
        self.on_with(Method::DELETE, pattern, handler, layers)
    }

    /// Appends a middleware around the whole router, not-found included.
    /// The first one added is the outermost.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Replaces the handler used when no route matches (default: empty 404).
    pub fn not_found(mut self, handler: impl Handler) -> Self {
        self.not_found = handler.into_boxed_handler();
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Ends registration, composing every middleware chain once.
    pub fn build(self) -> App {
        let routes = self.routes.len();
        let dispatcher = Dispatcher {
            routes: self.routes.into_iter().map(Route::into_selected).collect(),
            not_found: self.not_found,
        };
        let handler = self.middleware.wrap_boxed(Arc::new(dispatcher));
        debug!(routes, layers = self.middleware.len(), "router built");
        App { handler, routes }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("middleware", &self.middleware)
            .finish()
    }
}

/// A built router: global middleware around the dispatcher.
///
/// Immutable and `Clone` (an `Arc` inside); share it freely across tasks.
#[derive(Clone)]
pub struct App {
    handler: BoxedHandler,
    routes: usize,
}

impl App {
    /// Runs one request through the middleware and the first matching route.
    pub async fn call(&self, req: impl Into<Request>) -> Response {
        self.handler.call(req.into()).await
    }

    /// Number of registered routes.
    pub fn routes(&self) -> usize {
        self.routes
    }

    pub(crate) fn into_boxed(self) -> BoxedHandler {
        self.handler
    }
}

impl From<Router> for App {
    fn from(router: Router) -> Self {
        router.build()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App").field("routes", &self.routes).finish()
    }
}

struct Dispatcher {
    routes: Vec<SelectedRoute>,
    not_found: BoxedHandler,
}

impl ErasedHandler for Dispatcher {
    fn call(&self, req: Request) -> BoxFuture {
        for route in &self.routes {
            if let Some(selected) = route.evaluate(&req) {
                debug!(route = %route.label, "route selected");
                return route.handler.call(selected);
            }
        }
        debug!(method = %req.method(), path = %req.path(), "no route matched");
        self.not_found.call(req)
    }
}

async fn default_not_found(_req: Request) -> Response {
    Response::not_found()
}

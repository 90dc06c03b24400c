//! A registered route: an ordered check chain plus its handler.

use std::fmt;

use http::Method;

use crate::check::{MethodCheck, PathCheck, RouteCheck};
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::pattern::{Pattern, PatternError};
use crate::request::Request;

/// A route under construction.
///
/// Checks run in the order they were added and stop at the first rejection.
/// A route with no checks matches every request; register such routes last,
/// because the router picks the first route whose checks all pass.
///
/// ```rust
/// use trellis::{Method, Request, Route, middleware::Trace};
///
/// # async fn edit(_: Request) -> &'static str { "" }
/// let route = Route::at(Method::GET, "/posts/{id}/edit", edit)
///     .unwrap()
///     .layer(Trace);
/// ```
pub struct Route {
    label: String,
    checks: Vec<Box<dyn RouteCheck>>,
    middleware: MiddlewareChain,
    handler: BoxedHandler,
}

impl Route {
    /// A route with no checks around `handler`.
    pub fn new(handler: impl Handler) -> Self {
        Self {
            label: "*".to_owned(),
            checks: Vec::new(),
            middleware: MiddlewareChain::new(),
            handler: handler.into_boxed_handler(),
        }
    }

    /// A route checking the method first, then the path against `pattern`.
    pub fn at(method: Method, pattern: &str, handler: impl Handler) -> Result<Self, PatternError> {
        let pattern = Pattern::compile(pattern)?;
        let mut route = Self::new(handler).check(MethodCheck(method.clone()));
        route.label = format!("{method} {pattern}");
        Ok(route.check(PathCheck(pattern)))
    }

    /// Appends a check to the chain.
    pub fn check(mut self, check: impl RouteCheck) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Appends a middleware that wraps only this route's handler.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Replaces this route's middleware with `chain`.
    pub fn layers(mut self, chain: MiddlewareChain) -> Self {
        self.middleware = chain;
        self
    }

    /// `true` when the route has no checks and so accepts every request.
    pub fn is_catch_all(&self) -> bool {
        self.checks.is_empty()
    }

    /// Human-readable description used in logs, e.g. `GET /users/{id}`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs the check chain against `req`.
    ///
    /// Returns the handle produced by the last check when every check
    /// passes. `req` itself is never modified.
    pub fn evaluate(&self, req: &Request) -> Option<Request> {
        run_checks(&self.checks, req)
    }

    pub(crate) fn into_selected(self) -> SelectedRoute {
        let handler = self.middleware.wrap_boxed(self.handler);
        SelectedRoute { label: self.label, checks: self.checks, handler }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("label", &self.label)
            .field("checks", &self.checks.len())
            .field("middleware", &self.middleware)
            .finish()
    }
}

/// A route in its serving form: the middleware is composed around the
/// handler once, when the router is built.
pub(crate) struct SelectedRoute {
    pub(crate) label: String,
    checks: Vec<Box<dyn RouteCheck>>,
    pub(crate) handler: BoxedHandler,
}

impl SelectedRoute {
    pub(crate) fn evaluate(&self, req: &Request) -> Option<Request> {
        run_checks(&self.checks, req)
    }
}

fn run_checks(checks: &[Box<dyn RouteCheck>], req: &Request) -> Option<Request> {
    let mut current = req.clone();
    for check in checks {
        current = check.check(&current)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;

    use super::*;

    async fn noop(_req: Request) -> &'static str {
        ""
    }

    fn request(method: Method, path: &str) -> Request {
        http::Request::builder().method(method).uri(path).body(Bytes::new()).unwrap().into()
    }

    #[test]
    fn at_checks_method_then_path() {
        let route = Route::at(Method::GET, "/users/{id}", noop).unwrap();
        assert_eq!(route.label(), "GET /users/{id}");

        let selected = route.evaluate(&request(Method::GET, "/users/42")).unwrap();
        assert_eq!(selected.param("id"), Some("42"));

        assert!(route.evaluate(&request(Method::POST, "/users/42")).is_none());
        assert!(route.evaluate(&request(Method::GET, "/users")).is_none());
    }

    #[test]
    fn at_rejects_malformed_pattern() {
        assert!(Route::at(Method::GET, "/users/{id", noop).is_err());
    }

    #[test]
    fn route_without_checks_matches_everything() {
        let route = Route::new(noop);
        assert!(route.is_catch_all());
        assert!(route.evaluate(&request(Method::DELETE, "/anything/at/all")).is_some());
    }

    #[test]
    fn chain_stops_at_first_rejection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);

        let route = Route::new(noop)
            .check(|_req: &Request| -> Option<Request> { None })
            .check(move |req: &Request| {
                counted.fetch_add(1, Ordering::SeqCst);
                Some(req.clone())
            });

        assert!(route.evaluate(&request(Method::GET, "/")).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn later_checks_see_earlier_augmentation() {
        let route = Route::at(Method::GET, "/orgs/{org}", noop)
            .unwrap()
            .check(|req: &Request| (req.param("org") == Some("acme")).then(|| req.clone()));

        assert!(route.evaluate(&request(Method::GET, "/orgs/acme")).is_some());
        assert!(route.evaluate(&request(Method::GET, "/orgs/other")).is_none());
    }
}

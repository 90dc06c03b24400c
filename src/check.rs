//! Route checks: the predicates a request must pass for a route to be chosen.

use http::Method;

use crate::pattern::Pattern;
use crate::request::Request;

/// One predicate in a route's check chain.
///
/// `Some(handle)` means the request passed; the returned handle may carry
/// extra context, such as path variables. `None` rejects it. A check never
/// alters the handle it was given, which is what lets the router offer the
/// same request to the next route after a rejection.
///
/// Closures `Fn(&Request) -> Option<Request>` are checks too:
///
/// ```rust
/// use trellis::{Request, Route};
///
/// let htmx_only = |req: &Request| req.header("hx-request").map(|_| req.clone());
/// let route = Route::new(|_req: Request| async { "<li>partial</li>" }).check(htmx_only);
/// ```
pub trait RouteCheck: Send + Sync + 'static {
    fn check(&self, req: &Request) -> Option<Request>;
}

impl<F> RouteCheck for F
where
    F: Fn(&Request) -> Option<Request> + Send + Sync + 'static,
{
    fn check(&self, req: &Request) -> Option<Request> {
        self(req)
    }
}

/// Passes requests whose method equals the given one.
///
/// The comparison is plain equality and nothing is implied: a `GET` check
/// rejects `HEAD`. Register a `HEAD` route, or add a second check, for
/// clients that send `HEAD`.
#[derive(Clone, Debug)]
pub struct MethodCheck(pub Method);

impl RouteCheck for MethodCheck {
    fn check(&self, req: &Request) -> Option<Request> {
        (*req.method() == self.0).then(|| req.clone())
    }
}

/// Passes requests whose path matches a compiled [`Pattern`], attaching the
/// captured variables to the returned handle.
#[derive(Clone, Debug)]
pub struct PathCheck(pub Pattern);

impl RouteCheck for PathCheck {
    fn check(&self, req: &Request) -> Option<Request> {
        let params = self.0.matches(req.path())?;
        if params.is_empty() {
            Some(req.clone())
        } else {
            Some(req.with_params(params))
        }
    }
}

//! HTML forms can only submit `GET` and `POST`. This middleware lets a `POST`
//! form ask for `PUT`, `PATCH` or `DELETE` through a hidden field:
//!
//! ```html
//! <form method="post" action="/posts/7">
//!   <input type="hidden" name="_method" value="DELETE">
//! </form>
//! ```
//!
//! Place it before the router sees the request (i.e. as global middleware),
//! since route selection depends on the method.

use http::Method;
use tracing::debug;

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Rewrites the method of a base-method request from a form field.
#[derive(Clone, Debug)]
pub struct MethodOverride {
    field: String,
    base: Method,
}

impl MethodOverride {
    /// Overrides `POST` requests from the `_method` field.
    pub fn new() -> Self {
        Self { field: "_method".to_owned(), base: Method::POST }
    }

    /// Reads the override from `name` instead of `_method`.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.field = name.into();
        self
    }

    /// Only requests with this method are considered. Defaults to `POST`.
    pub fn base_method(mut self, method: Method) -> Self {
        self.base = method;
        self
    }

    fn apply(&self, req: Request) -> Request {
        if *req.method() != self.base {
            return req;
        }
        let method = match req.form_value(&self.field).as_deref() {
            Some("PUT") => Method::PUT,
            Some("PATCH") => Method::PATCH,
            Some("DELETE") => Method::DELETE,
            _ => return req,
        };
        debug!(from = %req.method(), to = %method, "method overridden");
        req.with_method(method)
    }
}

impl Default for MethodOverride {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for MethodOverride {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin(next.run(self.apply(req)))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn form(method: &str, body: &'static str) -> Request {
        http::Request::builder()
            .method(method)
            .uri("/posts/7")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
            .into()
    }

    #[test]
    fn overrides_post_with_allowed_methods() {
        let mw = MethodOverride::new();
        assert_eq!(mw.apply(form("POST", "_method=DELETE")).method(), Method::DELETE);
        assert_eq!(mw.apply(form("POST", "_method=PUT")).method(), Method::PUT);
        assert_eq!(mw.apply(form("POST", "_method=PATCH")).method(), Method::PATCH);
    }

    #[test]
    fn ignores_other_values_and_methods() {
        let mw = MethodOverride::new();
        assert_eq!(mw.apply(form("POST", "_method=GET")).method(), Method::POST);
        assert_eq!(mw.apply(form("POST", "_method=delete")).method(), Method::POST);
        assert_eq!(mw.apply(form("POST", "title=hi")).method(), Method::POST);
        assert_eq!(mw.apply(form("PUT", "_method=DELETE")).method(), Method::PUT);
    }

    #[test]
    fn custom_field_and_base() {
        let mw = MethodOverride::new().field("verb").base_method(Method::PUT);
        assert_eq!(mw.apply(form("PUT", "verb=PATCH")).method(), Method::PATCH);
        assert_eq!(mw.apply(form("POST", "verb=PATCH")).method(), Method::POST);
    }
}

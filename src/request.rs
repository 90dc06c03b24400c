//! Incoming HTTP request type.
//!
//! A [`Request`] is a handle: the URI, headers and body are shared behind
//! reference counts, so cloning one costs a few atomic increments. Route
//! checks and middleware never edit a handle in place. They derive a new one
//! ([`Request::with_params`], [`Request::with_method`]) and pass it on, which
//! leaves the original intact for the next candidate route.

use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri, Version};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;

use crate::params::Params;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a request body could not be buffered.
#[derive(Debug, thiserror::Error)]
pub(crate) enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("reading request body: {0}")]
    Read(BoxError),
}

#[derive(Debug)]
struct Head {
    uri: Uri,
    version: Version,
    headers: HeaderMap,
}

/// An incoming HTTP request with its body fully buffered.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    head: Arc<Head>,
    body: Bytes,
    params: Params,
}

impl Request {
    /// Buffers the body of `req`, refusing to hold more than `limit` bytes.
    pub(crate) async fn from_body<B>(req: http::Request<B>, limit: usize) -> Result<Self, BodyError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let body = match Limited::new(body, limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => return Err(BodyError::TooLarge { limit }),
            Err(e) => return Err(BodyError::Read(e)),
        };
        Ok(Self::from_parts(parts, body))
    }

    fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            head: Arc::new(Head { uri: parts.uri, version: parts.version, headers: parts.headers }),
            body,
            params: Params::default(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn version(&self) -> Version { self.head.version }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name)?.to_str().ok()
    }

    /// Path variables attached by the route that selected this request.
    ///
    /// Empty when none were attached; never an error.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns a named path variable.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Parses a named path variable, e.g. `req.param_as::<i64>("id")`.
    ///
    /// `None` if the variable is missing or does not parse.
    pub fn param_as<T: FromStr>(&self, name: &str) -> Option<T> {
        self.param(name)?.parse().ok()
    }

    /// A new handle carrying `params` on top of any already attached.
    pub fn with_params(&self, params: Params) -> Request {
        Request { params: self.params.merged(&params), ..self.clone() }
    }

    /// A new handle with its method replaced.
    pub fn with_method(&self, method: Method) -> Request {
        Request { method, ..self.clone() }
    }

    /// First value of a query-string parameter.
    pub fn query(&self, name: &str) -> Option<String> {
        self.head.uri.query().and_then(|q| lookup_urlencoded(q, name))
    }

    /// First value of a form field.
    ///
    /// An `application/x-www-form-urlencoded` body is consulted first, then
    /// the query string.
    pub fn form_value(&self, name: &str) -> Option<String> {
        let from_body = if self.is_urlencoded_form() {
            std::str::from_utf8(&self.body).ok().and_then(|b| lookup_urlencoded(b, name))
        } else {
            None
        };
        from_body.or_else(|| self.query(name))
    }

    fn is_urlencoded_form(&self) -> bool {
        self.header("content-type")
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body)
    }
}

fn lookup_urlencoded(encoded: &str, name: &str) -> Option<String> {
    encoded
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| decode_component(key).as_deref() == Some(name))
        .and_then(|(_, value)| decode_component(value))
}

fn decode_component(s: &str) -> Option<String> {
    let s = s.replace('+', " ");
    urlencoding::decode(&s).ok().map(|v| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, uri: &str, content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = http::Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("Content-Type", ct);
        }
        builder.body(Bytes::from_static(body.as_bytes())).unwrap().into()
    }

    #[test]
    fn accessors() {
        let req = request("GET", "/users/42?x=1", None, "");
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.path(), "/users/42");
        assert!(req.params().is_empty());
        assert_eq!(req.param("id"), None);
    }

    #[test]
    fn with_params_leaves_original_untouched() {
        let req = request("GET", "/users/42", None, "");
        let params: Params = [("id".to_owned(), "42".to_owned())].into_iter().collect();
        let augmented = req.with_params(params);

        assert_eq!(augmented.param("id"), Some("42"));
        assert_eq!(augmented.param_as::<u32>("id"), Some(42));
        assert_eq!(req.param("id"), None);
    }

    #[test]
    fn with_method_leaves_original_untouched() {
        let req = request("POST", "/", None, "");
        let overridden = req.with_method(Method::DELETE);
        assert_eq!(overridden.method(), Method::DELETE);
        assert_eq!(req.method(), Method::POST);
    }

    #[test]
    fn form_value_reads_urlencoded_body_first() {
        let req = request(
            "POST",
            "/x?_method=PATCH",
            Some("application/x-www-form-urlencoded; charset=utf-8"),
            "name=J%C3%BCrgen+Smith&_method=DELETE",
        );
        assert_eq!(req.form_value("_method").as_deref(), Some("DELETE"));
        assert_eq!(req.form_value("name").as_deref(), Some("Jürgen Smith"));
        assert_eq!(req.query("_method").as_deref(), Some("PATCH"));
    }

    #[test]
    fn form_value_falls_back_to_query() {
        let req = request("POST", "/x?_method=PUT", Some("application/json"), "_method=DELETE");
        assert_eq!(req.form_value("_method").as_deref(), Some("PUT"));
        assert_eq!(req.form_value("missing"), None);
    }

    #[tokio::test]
    async fn body_within_limit_is_buffered() {
        let req = http::Request::post("/upload")
            .body(http_body_util::Full::new(Bytes::from_static(b"hello")))
            .unwrap();
        let req = Request::from_body(req, 5).await.unwrap();
        assert_eq!(req.body().as_ref(), b"hello");
        assert_eq!(req.path(), "/upload");
    }

    #[tokio::test]
    async fn body_over_limit_is_refused() {
        let req = http::Request::post("/upload")
            .body(http_body_util::Full::new(Bytes::from(vec![0u8; 100])))
            .unwrap();
        assert!(matches!(
            Request::from_body(req, 10).await,
            Err(BodyError::TooLarge { limit: 10 })
        ));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = request("GET", "/", Some("text/plain"), "");
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("text/plain"));
    }
}

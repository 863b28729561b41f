//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use http::{HeaderMap, HeaderValue, Method, header::HeaderName};

/// An incoming HTTP request.
///
/// vigil serves GET-only probe and info endpoints, so the request body is
/// never read: a `Request` carries the request line, headers, the peer
/// address, and the path parameters captured by the router.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// Builds a request by hand. Useful in tests and for driving a composed
    /// handler without a socket.
    ///
    /// ```rust
    /// use vigil::Request;
    /// use http::Method;
    ///
    /// let req = Request::new(Method::GET, "/healthz");
    /// assert_eq!(req.path(), "/healthz");
    /// ```
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            remote_addr: None,
            params: HashMap::new(),
        }
    }

    /// Shorthand for `Request::new(Method::GET, path)`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub(crate) fn from_parts(parts: http::request::Parts, remote_addr: SocketAddr) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            headers: parts.headers,
            remote_addr: Some(remote_addr),
            params: HashMap::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values yield `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/static/{*path}`, `req.param("path")` on `/static/app.js`
    /// returns `Some("app.js")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

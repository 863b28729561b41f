//! Outgoing HTTP response type, the [`IntoResponse`] conversion trait, and
//! the [`ResponseWriter`] capability that middleware decorates.
//!
//! Handlers build a [`Response`] and return it. Anything that needs to
//! *observe* a response on its way out (see
//! [`ResponseCapture`](crate::middleware::ResponseCapture)) does so by
//! standing between [`Response::write_to`] and a [`ResponseWriter`].

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header::CONTENT_TYPE, header::HeaderName};
use http_body_util::Full;
use serde::Serialize;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values vigil emits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Css,          // text/css; charset=utf-8
    Html,         // text/html; charset=utf-8
    Javascript,   // text/javascript; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Svg,          // image/svg+xml
    Text,         // text/plain; charset=utf-8
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css         => "text/css; charset=utf-8",
            Self::Html        => "text/html; charset=utf-8",
            Self::Javascript  => "text/javascript; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Svg         => "image/svg+xml",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }

    /// Guesses a content type from a file extension (without the dot).
    /// Unknown extensions are served as `application/octet-stream`.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "css"         => Self::Css,
            "htm" | "html" => Self::Html,
            "js" | "mjs"  => Self::Javascript,
            "json"        => Self::Json,
            "svg"         => Self::Svg,
            "txt"         => Self::Text,
            _             => Self::OctetStream,
        }
    }

    fn header_value(self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

// ── ResponseWriter ────────────────────────────────────────────────────────────

/// The response-writing capability.
///
/// A writer receives headers, then a status, then zero or more body chunks.
/// [`Response`] is the buffering implementation; decorators such as
/// [`ResponseCapture`](crate::middleware::ResponseCapture) wrap another
/// writer and forward every call.
pub trait ResponseWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_status(&mut self, status: StatusCode);

    /// Appends `chunk` to the body and returns the number of bytes accepted.
    fn write(&mut self, chunk: &[u8]) -> usize;
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use vigil::Response;
/// use http::StatusCode;
///
/// Response::json(br#"{"status":"alive"}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use vigil::{ContentType, Response};
/// use http::StatusCode;
///
/// Response::builder()
///     .status(StatusCode::SERVICE_UNAVAILABLE)
///     .json(br#"{"status":"warming"}"#.to_vec());
///
/// Response::builder()
///     .bytes(ContentType::Html, b"<p>ok</p>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: Vec::new() }
    }

    /// An empty `200 OK` with no headers, ready to be written into.
    pub fn empty() -> Self {
        Self::status(StatusCode::OK)
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header lookup. Non-UTF-8 values yield `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Emits this response onto `writer`: headers first, then the status,
    /// then the whole body in one write.
    pub fn write_to<W: ResponseWriter + ?Sized>(self, writer: &mut W) {
        writer.headers_mut().extend(self.headers);
        writer.write_status(self.status);
        if !self.body.is_empty() {
            writer.write(&self.body);
        }
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

impl ResponseWriter for Response {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write(&mut self, chunk: &[u8]) -> usize {
        self.body.extend_from_slice(chunk);
        chunk.len()
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method — you always know what you're sending.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(ContentType::Json, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text, body.into().into_bytes())
    }

    /// Terminate with a typed body. Use this for HTML, CSS, images, etc.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.finish(content_type, body)
    }

    fn finish(mut self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.headers.insert(CONTENT_TYPE, content_type.header_value());
        Response { status: self.status, headers: self.headers, body }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// Override the status of any other response: `(StatusCode::SERVICE_UNAVAILABLE, Json(body))`
impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut res = self.1.into_response();
        res.status = self.0;
        res
    }
}

/// Serializes `T` with serde_json into an `application/json` body.
///
/// Serialization failures become a bare `500 Internal Server Error`; the
/// error detail goes to the log, never to the client.
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => Response::json(bytes),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_content_type_and_status() {
        let res = Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .json(b"{}".to_vec());

        assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.body(), b"{}");
    }

    #[test]
    fn write_to_replays_headers_status_and_body() {
        let src = Response::builder()
            .status(StatusCode::CREATED)
            .text("hello");

        let mut dst = Response::empty();
        src.write_to(&mut dst);

        assert_eq!(dst.status_code(), StatusCode::CREATED);
        assert_eq!(dst.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(dst.body(), b"hello");
    }

    #[test]
    fn extensions_map_to_served_types() {
        assert_eq!(ContentType::from_extension("css"), ContentType::Css);
        assert_eq!(ContentType::from_extension("JS"), ContentType::Javascript);
        assert_eq!(ContentType::from_extension("svg"), ContentType::Svg);
        assert_eq!(ContentType::from_extension("html"), ContentType::Html);
        assert_eq!(ContentType::from_extension("png"), ContentType::OctetStream);
        assert_eq!(ContentType::OctetStream.as_str(), "application/octet-stream");
    }

    #[test]
    fn tuple_overrides_status() {
        let res = (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response();
        assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.body(), b"busy");
    }

    #[test]
    fn json_wrapper_serializes_compactly() {
        #[derive(Serialize)]
        struct Body { status: &'static str }

        let res = Json(Body { status: "alive" }).into_response();
        assert_eq!(res.body(), br#"{"status":"alive"}"#);
        assert_eq!(res.header("content-type"), Some("application/json"));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(ContentType::from_extension("CSS"), ContentType::Css);
        assert_eq!(ContentType::from_extension("js"), ContentType::Javascript);
        assert_eq!(ContentType::from_extension("wasm"), ContentType::OctetStream);
    }
}

//! Fixed security response headers.

use http::HeaderValue;
use http::header::{self, HeaderName};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// The policy sent in `Content-Security-Policy`.
pub const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; img-src 'self' data:; style-src 'self' 'unsafe-inline'; script-src 'self'";

fn policy() -> [(HeaderName, HeaderValue); 4] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(CONTENT_SECURITY_POLICY)),
    ]
}

/// Stamps the same four security headers on every response, whatever the
/// route or status. Values already set by inner handlers are overwritten.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecurityHeaders;

impl Middleware for SecurityHeaders {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin(async move {
            let mut res = next.run(req).await;
            let headers = res.headers_mut();
            for (name, value) in policy() {
                headers.insert(name, value);
            }
            res
        })
    }
}

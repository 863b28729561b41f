//! Pass-through response observer.

use http::{HeaderMap, StatusCode};

use crate::response::ResponseWriter;

/// Decorates a [`ResponseWriter`], recording the status code and the number
/// of body bytes that flow through it. Every call is forwarded unchanged.
///
/// A body write with no status written beforehand counts as an implicit
/// `200 OK`. A later explicit status still replaces it.
pub struct ResponseCapture<W> {
    inner: W,
    status: Option<StatusCode>,
    bytes: usize,
}

impl<W: ResponseWriter> ResponseCapture<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, status: None, bytes: 0 }
    }

    /// The last status written, `None` if nothing was written at all.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Total body bytes accepted by the inner writer.
    pub fn bytes_written(&self) -> usize {
        self.bytes
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: ResponseWriter> ResponseWriter for ResponseCapture<W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = Some(status);
        self.inner.write_status(status);
    }

    fn write(&mut self, chunk: &[u8]) -> usize {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        let n = self.inner.write(chunk);
        self.bytes += n;
        n
    }
}

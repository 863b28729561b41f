//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! The router holds handlers of *different* types in a single
//! `HashMap<Method, Tree>`, and the middleware chain nests them inside each
//! other. Both need one uniform type, so handlers are hidden behind a trait
//! object (`dyn ErasedHandler`).
//!
//! ```text
//! async fn healthz(req: Request) -> Response { … }   ← user writes this
//!        ↓ router.get("/healthz", healthz)
//! healthz.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(healthz))                       ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time                 ← one vtable dispatch
//!        ↓
//! Box::pin(async { healthz(req).await.into_response() })  ← BoxFuture
//! ```
//!
//! A [`Router`](crate::Router) and every middleware layer are themselves
//! `ErasedHandler`s, so a fully composed application is just another
//! `BoxedHandler`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Pin<Box<…>>` because the runtime polls the future in place; `Send +
/// 'static` so tokio can move it between worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe dispatch interface shared by handlers, middleware layers and
/// the router.
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` (or closure returning a future) with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Erases a handler so it can be passed to [`chain`](crate::middleware::chain)
/// or registered under several paths.
pub fn boxed(handler: impl Handler) -> BoxedHandler {
    handler.into_boxed_handler()
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype bridging a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A path registered under
//! another method answers `405` with an `Allow` header; anything else is `404`.

use std::collections::HashMap;
use std::sync::Arc;

use http::{HeaderValue, Method, StatusCode, header::ALLOW};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// Result of resolving a method + path pair.
pub(crate) enum Lookup {
    Found(BoxedHandler, HashMap<String, String>),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// The application router.
///
/// Build it once at startup, then either pass it to
/// [`chain`](crate::middleware::chain) via [`Router::into_handler`] or call it
/// directly: a `Router` is itself an [`ErasedHandler`].
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax, catch-alls `{*name}`:
    ///
    /// ```rust,no_run
    /// # use vigil::{Request, Response, Router};
    /// # use http::Method;
    /// # async fn asset(_: Request) -> Response { Response::text("") }
    /// Router::new().on(Method::GET, "/static/{*path}", asset);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with an existing one.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.insert(method, path, handler.into_boxed_handler())
    }

    /// Shorthand for `on(Method::GET, path, handler)`.
    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    /// Register one handler instance under every path in `paths`.
    ///
    /// Aliases share the same `Arc`, so they cannot diverge in behavior.
    pub fn get_aliases(self, paths: &[&str], handler: impl Handler) -> Self {
        let handler = handler.into_boxed_handler();
        paths.iter().fold(self, |router, path| {
            router.insert(Method::GET, path, Arc::clone(&handler))
        })
    }

    fn insert(mut self, method: Method, path: &str, handler: BoxedHandler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Lookup {
        if let Some(matched) = self.routes.get(method).and_then(|tree| tree.at(path).ok()) {
            let handler = Arc::clone(matched.value);
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Lookup::Found(handler, params);
        }

        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(m, tree)| *m != method && tree.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect();

        if allowed.is_empty() {
            Lookup::NotFound
        } else {
            allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            Lookup::MethodNotAllowed(allowed)
        }
    }

    /// Erase the router so middleware can wrap it.
    pub fn into_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl ErasedHandler for Router {
    fn call(&self, mut req: Request) -> BoxFuture {
        match self.lookup(&req.method, &req.path) {
            Lookup::Found(handler, params) => {
                req.params = params;
                handler.call(req)
            }
            Lookup::MethodNotAllowed(allowed) => {
                let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                let mut res = Response::status(StatusCode::METHOD_NOT_ALLOWED);
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    res.headers.insert(ALLOW, value);
                }
                Box::pin(async move { res })
            }
            Lookup::NotFound => Box::pin(async {
                Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .text("404 page not found")
            }),
        }
    }
}

//! Embedded static assets: the landing page at `/` and files under `/static/`.
//!
//! Everything in the crate's `static/` directory is compiled into the binary.

use std::path::Path;

use http::StatusCode;
use include_dir::{Dir, include_dir};

use crate::error::Error;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::router::Router;

static STATIC_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/static");

const INDEX: &str = "index.html";

/// Read-only view over an embedded asset tree.
#[derive(Clone, Copy, Debug)]
pub struct Assets {
    dir: &'static Dir<'static>,
    index: &'static [u8],
}

impl Assets {
    /// The assets compiled into this binary.
    pub fn embedded() -> Result<Self, Error> {
        Self::from_dir(&STATIC_DIR)
    }

    /// Fails if the tree has no top-level `index.html`.
    pub fn from_dir(dir: &'static Dir<'static>) -> Result<Self, Error> {
        let index = dir
            .get_file(INDEX)
            .ok_or_else(|| Error::Config(format!("static asset `{INDEX}` is missing")))?
            .contents();
        Ok(Self { dir, index })
    }

    pub fn index(&self) -> &'static [u8] {
        self.index
    }

    /// Looks up a file by its path relative to the asset root.
    pub fn file(&self, path: &str) -> Option<(ContentType, &'static [u8])> {
        let path = if path.is_empty() { INDEX } else { path };
        let file = self.dir.get_file(path)?;
        let content_type = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(ContentType::OctetStream, ContentType::from_extension);
        Some((content_type, file.contents()))
    }
}

/// `GET /`: the landing page.
pub async fn home(assets: Assets, _req: Request) -> Response {
    Response::builder().bytes(ContentType::Html, assets.index().to_vec())
}

/// `GET /static/{*path}`: one embedded file, or `404`.
pub async fn asset(assets: Assets, req: Request) -> Response {
    match assets.file(req.param("path").unwrap_or_default()) {
        Some((content_type, body)) => Response::builder().bytes(content_type, body.to_vec()),
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .text("404 page not found"),
    }
}

pub fn routes(router: Router, assets: Assets) -> Router {
    router
        .get("/", move |req| home(assets, req))
        .get_aliases(&["/static/", "/static/{*path}"], move |req| asset(assets, req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ErasedHandler;

    static EMPTY: Dir<'static> = Dir::new("", &[]);

    #[test]
    fn missing_index_is_a_config_error() {
        let err = Assets::from_dir(&EMPTY).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("index.html"));
    }

    #[test]
    fn embedded_tree_has_index() {
        let assets = Assets::embedded().unwrap();
        assert!(!assets.index().is_empty());
    }

    #[tokio::test]
    async fn home_is_html() {
        let router = routes(Router::new(), Assets::embedded().unwrap());
        let res = router.call(Request::get("/")).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(res.header("content-type").unwrap().contains("text/html"));
        assert!(String::from_utf8_lossy(res.body()).contains("<title>Vigil</title>"));
    }

    #[tokio::test]
    async fn static_files_get_content_types() {
        let router = routes(Router::new(), Assets::embedded().unwrap());

        let css = router.call(Request::get("/static/style.css")).await;
        assert_eq!(css.status_code(), StatusCode::OK);
        assert_eq!(css.header("content-type"), Some("text/css; charset=utf-8"));

        let js = router.call(Request::get("/static/app.js")).await;
        assert_eq!(js.header("content-type"), Some("text/javascript; charset=utf-8"));
    }

    #[tokio::test]
    async fn static_root_serves_index() {
        let router = routes(Router::new(), Assets::embedded().unwrap());
        let res = router.call(Request::get("/static/")).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), Assets::embedded().unwrap().index());
    }

    #[tokio::test]
    async fn unknown_assets_are_404() {
        let router = routes(Router::new(), Assets::embedded().unwrap());

        for path in ["/static/nope.css", "/static/../Cargo.toml", "/favicon.ico"] {
            let res = router.call(Request::get(path)).await;
            assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{path}");
        }
    }
}

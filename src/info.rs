//! Application metadata endpoints: `/api/info` and `/version`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::readiness::ReadinessModel;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;

pub const DEFAULT_NAME: &str = "Vigil";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_COMMIT: &str = "unknown";
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Build-time and deploy-time identity of the running service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildInfo {
    pub name: String,
    pub version: String,
    pub commit: String,
    pub environment: String,
    pub build_time: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            version: DEFAULT_VERSION.to_owned(),
            commit: DEFAULT_COMMIT.to_owned(),
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            build_time: String::new(),
        }
    }
}

/// Snapshot served by the info endpoints. Built fresh per request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub environment: String,
    pub build_time: String,
    pub uptime: String,
    pub hostname: String,
}

/// Shared state for the info handlers.
#[derive(Clone, Debug)]
pub struct InfoState {
    pub build: Arc<BuildInfo>,
    pub readiness: Arc<ReadinessModel>,
}

impl InfoState {
    fn snapshot(&self, with_commit: bool) -> AppInfo {
        let build = &self.build;
        AppInfo {
            name: build.name.clone(),
            version: build.version.clone(),
            commit: with_commit.then(|| build.commit.clone()),
            environment: build.environment.clone(),
            build_time: build.build_time.clone(),
            uptime: format_uptime(self.readiness.uptime()),
            hostname: local_hostname(),
        }
    }
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Renders whole seconds as `1h2m3s`, `4m0s`, `5s`, or `0s`.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let (hours, minutes, seconds) = (total / 3600, total / 60 % 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// `GET /api/info`: everything except the commit.
pub async fn info(state: Arc<InfoState>, _req: Request) -> Response {
    Json(state.snapshot(false)).into_response()
}

/// `GET /version`: everything including the commit.
pub async fn version(state: Arc<InfoState>, _req: Request) -> Response {
    Json(state.snapshot(true)).into_response()
}

pub fn routes(router: Router, state: Arc<InfoState>) -> Router {
    let version_state = Arc::clone(&state);
    router
        .get("/api/info", move |req| info(Arc::clone(&state), req))
        .get("/version", move |req| version(Arc::clone(&version_state), req))
}

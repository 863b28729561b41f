//! Kubernetes probe handlers.
//!
//! | Probe | Paths | Question |
//! |---|---|---|
//! | **Health** | `/health`, `/healthz` | Is the process running? |
//! | **Liveness** | `/live`, `/livez` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/ready`, `/readyz` | Has warm-up finished? Failure → pulled from load-balancer. |
//!
//! Health and liveness answer `200` unconditionally: if the process can
//! respond to HTTP at all, it is running. Readiness answers `503` until the
//! [`ReadinessModel`] says warm-up is over, then `200` for good.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vigil::{Router, health};
//! use vigil::readiness::{ReadinessModel, ServiceClock};
//!
//! let model = Arc::new(ReadinessModel::new(ServiceClock::start_now(), Duration::from_secs(2)));
//! let app = health::routes(Router::new(), model);
//! ```

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;

use crate::readiness::{Readiness, ReadinessModel};
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;

pub const HEALTH_PATHS: [&str; 2] = ["/health", "/healthz"];
pub const LIVE_PATHS: [&str; 2] = ["/live", "/livez"];
pub const READY_PATHS: [&str; 2] = ["/ready", "/readyz"];

/// Probe body: `{"status":"…"}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Alive,
    Warming,
    Ready,
}

#[derive(Serialize)]
struct ProbeBody {
    status: ProbeStatus,
}

fn probe(status: StatusCode, body: ProbeStatus) -> Response {
    (status, Json(ProbeBody { status: body })).into_response()
}

/// Health probe. Always `200 {"status":"healthy"}`.
pub async fn health(_req: Request) -> Response {
    probe(StatusCode::OK, ProbeStatus::Healthy)
}

/// Liveness probe. Always `200 {"status":"alive"}`.
pub async fn liveness(_req: Request) -> Response {
    probe(StatusCode::OK, ProbeStatus::Alive)
}

/// Readiness probe against `model`.
///
/// `503 {"status":"warming"}` during warm-up, `200 {"status":"ready"}` after.
pub async fn readiness(model: Arc<ReadinessModel>, _req: Request) -> Response {
    match model.state() {
        Readiness::Warming => probe(StatusCode::SERVICE_UNAVAILABLE, ProbeStatus::Warming),
        Readiness::Ready => probe(StatusCode::OK, ProbeStatus::Ready),
    }
}

/// Registers all three probes, each under both of its paths.
pub fn routes(router: Router, model: Arc<ReadinessModel>) -> Router {
    router
        .get_aliases(&HEALTH_PATHS, health)
        .get_aliases(&LIVE_PATHS, liveness)
        .get_aliases(&READY_PATHS, move |req| readiness(Arc::clone(&model), req))
}

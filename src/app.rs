//! Composition root: every route behind the same middleware stack.

use std::sync::Arc;

use crate::assets::{self, Assets};
use crate::config::Config;
use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::health;
use crate::info::{self, BuildInfo, InfoState};
use crate::metrics::{self, HttpMetrics};
use crate::middleware::{self, BoxedMiddleware, RequestLogger, SecurityHeaders};
use crate::readiness::{ReadinessModel, ServiceClock};
use crate::router::Router;

/// Everything the handlers read. Built once at startup, shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub readiness: Arc<ReadinessModel>,
    pub build: Arc<BuildInfo>,
    pub metrics: Arc<HttpMetrics>,
    pub assets: Assets,
}

impl AppState {
    pub fn new(readiness: ReadinessModel, build: BuildInfo) -> Result<Self, Error> {
        Ok(Self {
            readiness: Arc::new(readiness),
            build: Arc::new(build),
            metrics: Arc::new(HttpMetrics::new()?),
            assets: Assets::embedded()?,
        })
    }

    /// State for a process that started at `clock`.
    pub fn from_config(config: &Config, clock: ServiceClock) -> Result<Self, Error> {
        Self::new(ReadinessModel::new(clock, config.ready_after()), config.build_info())
    }
}

/// The full route table, unwrapped.
pub fn router(state: &AppState) -> Router {
    let info_state = Arc::new(InfoState {
        build: Arc::clone(&state.build),
        readiness: Arc::clone(&state.readiness),
    });

    let router = assets::routes(Router::new(), state.assets);
    let router = info::routes(router, info_state);
    let router = health::routes(router, Arc::clone(&state.readiness));
    metrics::routes(router, Arc::clone(&state.metrics))
}

/// The middleware stack, outermost first.
pub fn middleware(state: &AppState) -> Vec<BoxedMiddleware> {
    let metrics: BoxedMiddleware = state.metrics.clone();
    vec![Arc::new(SecurityHeaders), Arc::new(RequestLogger), metrics]
}

/// The router wrapped in the middleware stack, ready to serve.
pub fn build(state: &AppState) -> BoxedHandler {
    middleware::chain(router(state).into_handler(), middleware(state))
}

//! # vigil
//!
//! A minimal web service that knows when it is ready. It serves a landing
//! page, a JSON info endpoint, Prometheus metrics, and the three Kubernetes
//! probes: health, liveness, readiness.
//!
//! ## The pipeline
//!
//! Every request, whatever its route or outcome, passes through the same
//! middleware stack:
//!
//! ```text
//! request → SecurityHeaders → RequestLogger → HttpMetrics → Router → handler
//! ```
//!
//! - [`middleware::SecurityHeaders`] stamps four fixed security headers.
//! - [`middleware::RequestLogger`] emits one structured record per request.
//! - [`metrics::HttpMetrics`] counts requests and observes latency.
//!
//! ## Readiness
//!
//! `/ready` answers `503 {"status":"warming"}` for a configurable warm-up
//! period after start and `200 {"status":"ready"}` afterwards. The
//! [`readiness::ReadinessModel`] behind it takes its start instant, threshold
//! and clock as constructor arguments, so none of it is global.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use vigil::{Server, app};
//! use vigil::info::BuildInfo;
//! use vigil::readiness::{ReadinessModel, ServiceClock};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vigil::Error> {
//!     let readiness = ReadinessModel::new(ServiceClock::start_now(), Duration::from_secs(2));
//!     let state = app::AppState::new(readiness, BuildInfo::default())?;
//!
//!     Server::bind("0.0.0.0:8080".parse().unwrap())
//!         .await?
//!         .serve(app::build(&state))
//!         .await
//! }
//! ```

mod error;
mod request;
mod response;
mod router;
mod server;

pub mod app;
pub mod assets;
pub mod config;
pub mod handler;
pub mod health;
pub mod info;
pub mod metrics;
pub mod middleware;
pub mod readiness;

pub use error::Error;
pub use handler::{BoxedHandler, ErasedHandler, Handler};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseWriter};
pub use router::Router;
pub use server::{Server, shutdown_signal};

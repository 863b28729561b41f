use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vigil::Server;
use vigil::app::{self, AppState};
use vigil::config::{Config, LogFormat};
use vigil::readiness::ServiceClock;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    // Recorded before anything else so uptime covers startup.
    let clock = ServiceClock::start_now();
    let config = Config::parse();
    init_tracing(config.log_format);

    if let Err(e) = run(config, clock).await {
        error!(error = %format!("{e:#}"), "fatal");
        std::process::exit(1);
    }
}

async fn run(config: Config, clock: ServiceClock) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let state = AppState::from_config(&config, clock).context("failed to initialise application")?;

    info!(
        port = config.port,
        commit = %config.commit,
        version = %config.app_version,
        env = %config.app_env,
        build_time = %config.build_time,
        ready_after_secs = config.ready_after_secs,
        "server starting"
    );

    Server::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?
        .drain_timeout(config.shutdown_timeout())
        .header_read_timeout(config.header_read_timeout())
        .serve(app::build(&state))
        .await?;

    Ok(())
}

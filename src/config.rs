//! Command-line and environment configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::Error;
use crate::info::{self, BuildInfo};

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable, for local development
    Pretty,
}

/// vigil - a minimal web service with health, liveness and readiness probes
#[derive(Parser, Debug, Clone)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Bind address
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Listen port
    #[arg(short, long, default_value = "8080", env = "PORT")]
    pub port: u16,

    /// Display name reported by /api/info and /version
    #[arg(long, default_value = info::DEFAULT_NAME, env = "APP_NAME")]
    pub app_name: String,

    /// Version reported by /api/info and /version
    #[arg(long, default_value = info::DEFAULT_VERSION, env = "APP_VERSION")]
    pub app_version: String,

    /// Deployment environment name
    #[arg(long, default_value = info::DEFAULT_ENVIRONMENT, env = "APP_ENV")]
    pub app_env: String,

    /// Build timestamp, usually injected by CI
    #[arg(long, default_value = "", env = "BUILD_TIME")]
    pub build_time: String,

    /// Source commit, usually injected by CI
    #[arg(long, default_value = info::DEFAULT_COMMIT, env = "APP_COMMIT")]
    pub commit: String,

    /// Seconds after start before /ready reports ready
    #[arg(long, default_value_t = 2, env = "READY_AFTER_SECS")]
    pub ready_after_secs: u64,

    /// Seconds to wait for in-flight connections on shutdown
    #[arg(long, default_value_t = 10, env = "SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: u64,

    /// Seconds a client has to send request headers
    #[arg(long, default_value_t = 5, env = "HEADER_READ_TIMEOUT_SECS")]
    pub header_read_timeout_secs: u64,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json, env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Config {
    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| Error::Config(format!("invalid host `{}`: {e}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn build_info(&self) -> BuildInfo {
        BuildInfo {
            name: self.app_name.clone(),
            version: self.app_version.clone(),
            commit: self.commit.clone(),
            environment: self.app_env.clone(),
            build_time: self.build_time.clone(),
        }
    }

    pub fn ready_after(&self) -> Duration {
        Duration::from_secs(self.ready_after_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn header_read_timeout(&self) -> Duration {
        Duration::from_secs(self.header_read_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "vigil",
            "--port", "9090",
            "--host", "127.0.0.1",
            "--app-version", "vTest",
            "--commit", "abc123",
            "--build-time", "2025-01-01T00:00:00Z",
            "--ready-after-secs", "10",
            "--log-format", "pretty",
        ])
        .unwrap();

        assert_eq!(config.socket_addr().unwrap(), "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.ready_after(), Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Pretty);

        let build = config.build_info();
        assert_eq!(build.version, "vTest");
        assert_eq!(build.commit, "abc123");
        assert_eq!(build.build_time, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn cli_defaults_match_build_info_defaults() {
        let config = Config::try_parse_from([
            "vigil",
            "--app-name", info::DEFAULT_NAME,
            "--app-version", info::DEFAULT_VERSION,
            "--app-env", info::DEFAULT_ENVIRONMENT,
            "--commit", info::DEFAULT_COMMIT,
        ])
        .unwrap();
        assert_eq!(config.build_info(), BuildInfo::default());

        let cmd = <Config as clap::CommandFactory>::command();
        let default_of = |id: &str| {
            cmd.get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_default_values().first())
                .and_then(|value| value.to_str())
                .map(str::to_owned)
        };
        assert_eq!(default_of("app_version").as_deref(), Some("1.0.0"));
        assert_eq!(default_of("app_name").as_deref(), Some(BuildInfo::default().name.as_str()));
        assert_eq!(default_of("commit").as_deref(), Some(BuildInfo::default().commit.as_str()));
    }

    #[test]
    fn bad_host_is_a_config_error() {
        let config = Config::try_parse_from(["vigil", "--host", "not-an-ip"]).unwrap();
        assert!(matches!(config.socket_addr(), Err(Error::Config(_))));
    }
}

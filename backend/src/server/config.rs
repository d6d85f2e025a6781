//! Server settings loaded via OrthoConfig and the runtime configuration
//! object built from them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ortho_config::OrthoConfig;
use payroll::domain::ports::{FixturePayslipRenderer, PayslipRenderer};
use payroll::outbound::persistence::{DbPool, PoolConfig};
use payroll::outbound::renderer::{HttpPayslipRenderer, RendererBuildError};
use serde::Deserialize;
use url::Url;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_RENDERER_TIMEOUT_SECS: u64 = 10;

/// Errors raised while interpreting [`ServerSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The bind address did not parse as `host:port`.
    #[error("invalid bind address {value:?}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    /// The renderer base URL did not parse.
    #[error("invalid renderer url {value:?}: {source}")]
    RendererUrl {
        value: String,
        source: url::ParseError,
    },
    /// The HTTP renderer client could not be built.
    #[error(transparent)]
    Renderer(#[from] RendererBuildError),
    /// No database is configured and fixture data is not allowed.
    #[error("PAYROLL_DATABASE_URL must be set outside development builds")]
    MissingDatabaseUrl,
}

/// Process settings read from `PAYROLL_*` environment variables, an optional
/// configuration file and command-line flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PAYROLL")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. Fixture ports serve requests when unset.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Base URL of the payslip rendering service.
    pub renderer_url: Option<String>,
    /// Per-request renderer timeout in seconds.
    pub renderer_timeout_secs: Option<u64>,
}

impl ServerSettings {
    /// Return the listen address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the configured value does not
    /// parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        match self.bind_addr.as_deref() {
            None => Ok(DEFAULT_BIND_ADDR),
            Some(value) => value.parse().map_err(|source| SettingsError::BindAddr {
                value: value.to_owned(),
                source,
            }),
        }
    }

    /// Return the database URL to connect to.
    ///
    /// `Ok(None)` means the server should serve fixture data, which only
    /// `allow_fixtures` permits.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingDatabaseUrl`] when no URL is set and
    /// fixtures are not allowed.
    pub fn database_url(&self, allow_fixtures: bool) -> Result<Option<&str>, SettingsError> {
        match self.database_url.as_deref() {
            Some(url) => Ok(Some(url)),
            None if allow_fixtures => Ok(None),
            None => Err(SettingsError::MissingDatabaseUrl),
        }
    }

    /// Return the pool size, falling back to the default.
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(PoolConfig::DEFAULT_MAX_SIZE)
    }

    /// Return the renderer timeout, falling back to the default.
    pub fn renderer_timeout(&self) -> Duration {
        Duration::from_secs(
            self.renderer_timeout_secs
                .unwrap_or(DEFAULT_RENDERER_TIMEOUT_SECS),
        )
    }

    /// Return the parsed renderer URL, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::RendererUrl`] when the value does not parse.
    pub fn renderer_url(&self) -> Result<Option<Url>, SettingsError> {
        self.renderer_url
            .as_deref()
            .map(|value| {
                Url::parse(value).map_err(|source| SettingsError::RendererUrl {
                    value: value.to_owned(),
                    source,
                })
            })
            .transpose()
    }

    /// Build the payslip renderer adapter.
    ///
    /// Falls back to [`FixturePayslipRenderer`] when no renderer URL is set.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the URL is malformed or the HTTP client
    /// cannot be built.
    pub fn build_renderer(&self) -> Result<Arc<dyn PayslipRenderer>, SettingsError> {
        match self.renderer_url()? {
            Some(url) => Ok(Arc::new(HttpPayslipRenderer::new(
                &url,
                self.renderer_timeout(),
            )?)),
            None => Ok(Arc::new(FixturePayslipRenderer)),
        }
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) renderer: Arc<dyn PayslipRenderer>,
}

impl ServerConfig {
    /// Construct a configuration that serves fixture ports on `bind_addr`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            renderer: Arc::new(FixturePayslipRenderer),
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, the server wires the payroll services to the Diesel
    /// repositories instead of the fixture ports.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Replace the payslip renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn PayslipRenderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for server settings parsing.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 5] = [
        "PAYROLL_BIND_ADDR",
        "PAYROLL_DATABASE_URL",
        "PAYROLL_POOL_MAX_SIZE",
        "PAYROLL_RENDERER_URL",
        "PAYROLL_RENDERER_TIMEOUT_SECS",
    ];

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("payroll")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr().expect("default addr"), DEFAULT_BIND_ADDR);
        assert!(settings.database_url.is_none());
        assert_eq!(settings.pool_max_size(), PoolConfig::DEFAULT_MAX_SIZE);
        assert_eq!(settings.renderer_timeout(), Duration::from_secs(10));
        assert!(settings.renderer_url().expect("no url").is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PAYROLL_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            (
                "PAYROLL_DATABASE_URL",
                Some("postgres://payroll@localhost/payroll".to_owned()),
            ),
            ("PAYROLL_POOL_MAX_SIZE", Some("4".to_owned())),
            (
                "PAYROLL_RENDERER_URL",
                Some("http://renderer.internal/".to_owned()),
            ),
            ("PAYROLL_RENDERER_TIMEOUT_SECS", Some("3".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("addr"),
            "127.0.0.1:9090".parse::<SocketAddr>().expect("literal addr")
        );
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://payroll@localhost/payroll")
        );
        assert_eq!(settings.pool_max_size(), 4);
        assert_eq!(settings.renderer_timeout(), Duration::from_secs(3));
        assert_eq!(
            settings
                .renderer_url()
                .expect("url parses")
                .map(|url| url.host_str().map(str::to_owned)),
            Some(Some("renderer.internal".to_owned()))
        );
        assert!(settings.build_renderer().is_ok());
    }

    #[rstest]
    fn missing_database_url_is_fatal_without_fixtures() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert!(matches!(settings.database_url(true), Ok(None)));
        assert!(matches!(
            settings.database_url(false),
            Err(SettingsError::MissingDatabaseUrl)
        ));
    }

    #[rstest]
    fn configured_database_url_is_used_either_way() {
        let _guard = lock_env(VARS.map(|name| {
            let value = (name == "PAYROLL_DATABASE_URL")
                .then(|| "postgres://payroll@localhost/payroll".to_owned());
            (name, value)
        }));

        let settings = load_from_empty_args();
        for allow_fixtures in [true, false] {
            assert_eq!(
                settings.database_url(allow_fixtures).expect("url configured"),
                Some("postgres://payroll@localhost/payroll")
            );
        }
    }

    #[rstest]
    #[case("PAYROLL_BIND_ADDR", "not-an-address")]
    #[case("PAYROLL_RENDERER_URL", "::nope")]
    fn malformed_values_are_reported(#[case] name: &str, #[case] value: &str) {
        let _guard = lock_env(VARS.map(|var| {
            let override_value = (var == name).then(|| value.to_owned());
            (var, override_value)
        }));

        let settings = load_from_empty_args();
        let failed = settings.bind_addr().is_err() || settings.renderer_url().is_err();
        assert!(failed, "{name}={value} should be rejected");
    }
}

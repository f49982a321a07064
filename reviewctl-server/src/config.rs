//! Service configuration
//!
//! Layered, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. Optional TOML file (`[server]` and `[database]` tables)
//! 3. Environment (`SERVER_*`, `DATABASE_URL`, `DB_*`)
//!
//! CLI flags are applied on top by the binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("database not configured: set DATABASE_URL or DB_HOST/DB_NAME")]
    MissingDatabase,

    #[error("invalid database URL: {0}")]
    InvalidDatabaseUrl(#[source] sqlx::Error),
}

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Per-request timeout applied to every route
    pub request_timeout_secs: u64,
    /// Allow any CORS origin
    pub cors_permissive: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 15,
            cors_permissive: false,
        }
    }
}

/// PostgreSQL settings. `url` wins over the discrete fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            host: None,
            port: None,
            user: None,
            password: None,
            name: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a TOML file, then overlay the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Self = toml::from_str(&content)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        tracing::debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = parse_env("SERVER_PORT", port)?;
        }

        let db = &mut self.database;
        if let Some(url) = lookup("DATABASE_URL") {
            db.url = Some(url);
        }
        if let Some(host) = lookup("DB_HOST") {
            db.host = Some(host);
        }
        if let Some(port) = lookup("DB_PORT") {
            db.port = Some(parse_env("DB_PORT", port)?);
        }
        if let Some(user) = lookup("DB_USER") {
            db.user = Some(user);
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            db.password = Some(password);
        }
        if let Some(name) = lookup("DB_NAME") {
            db.name = Some(name);
        }
        if let Some(max) = lookup("DB_MAX_CONNECTIONS") {
            db.max_connections = parse_env("DB_MAX_CONNECTIONS", max)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

impl ServerSettings {
    /// Listener address. `host` may be an IP literal or a resolvable name
    /// such as `localhost`; the first resolved address wins.
    pub async fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        if let Ok(parsed) = addr.parse() {
            return Ok(parsed);
        }

        tokio::net::lookup_host(addr.as_str())
            .await
            .ok()
            .and_then(|mut resolved| resolved.next())
            .ok_or(ConfigError::InvalidAddress(addr))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl DatabaseSettings {
    /// Build connect options from the URL or the discrete fields.
    ///
    /// Discrete fields connect without TLS, matching a local/compose setup.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        if let Some(url) = &self.url {
            return url.parse().map_err(ConfigError::InvalidDatabaseUrl);
        }

        let host = self.host.as_deref().ok_or(ConfigError::MissingDatabase)?;
        let name = self.name.as_deref().ok_or(ConfigError::MissingDatabase)?;

        let mut options = PgConnectOptions::new()
            .host(host)
            .port(self.port.unwrap_or(5432))
            .database(name)
            .ssl_mode(PgSslMode::Disable);
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(15));
        assert!(!config.server.cors_permissive);
        assert_eq!(config.database.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[tokio::test]
    async fn bind_addr_accepts_ip_and_hostname() {
        let mut server = ServerSettings::default();
        assert_eq!(
            server.bind_addr().await.unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );

        server.host = "localhost".into();
        server.port = 9090;
        let addr = server.bind_addr().await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 9090);
    }

    #[test]
    fn env_overrides_port_and_database() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("SERVER_PORT", "9090"),
                ("DB_HOST", "db"),
                ("DB_PORT", "6543"),
                ("DB_USER", "review"),
                ("DB_PASSWORD", "secret"),
                ("DB_NAME", "reviews"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9090);
        let options = config.database.connect_options().unwrap();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "review");
        assert_eq!(options.get_database(), Some("reviews"));
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("SERVER_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "SERVER_PORT", .. }));
    }

    #[test]
    fn url_takes_precedence() {
        let settings = DatabaseSettings {
            url: Some("postgres://u:p@urlhost:5433/urldb".into()),
            host: Some("ignored".into()),
            name: Some("ignored".into()),
            ..Default::default()
        };
        let options = settings.connect_options().unwrap();
        assert_eq!(options.get_host(), "urlhost");
        assert_eq!(options.get_database(), Some("urldb"));
    }

    #[test]
    fn missing_database_is_an_error() {
        let err = DatabaseSettings::default().connect_options().unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabase));
    }

    #[test]
    fn loads_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 7000\nrequest_timeout_secs = 5\n\n[database]\nurl = \"postgres://localhost/reviews\"\nmax_connections = 12"
        )
        .unwrap();

        let mut config: AppConfig =
            toml::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        config.apply_env(env(&[])).unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.request_timeout_secs, 5);
        assert_eq!(config.database.max_connections, 12);
        assert!(config.database.connect_options().is_ok());
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = AppConfig::load(Path::new("/nonexistent/reviewctl.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/reviewctl.toml"));
    }
}

//! # Database Configuration
//!
//! `DbConfig` is built in code (tests, the seed binary) or read from the
//! environment at startup.
//!
//! | Variable                            | Default          |
//! |-------------------------------------|------------------|
//! | `SHOPFRONT_DB_PATH`                 | `./shopfront.db` |
//! | `SHOPFRONT_DB_MAX_CONNECTIONS`      | `5`              |
//! | `SHOPFRONT_DB_CONNECT_TIMEOUT_SECS` | `30`             |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "./shopfront.db";

const ENV_PATH: &str = "SHOPFRONT_DB_PATH";
const ENV_MAX_CONNECTIONS: &str = "SHOPFRONT_DB_MAX_CONNECTIONS";
const ENV_CONNECT_TIMEOUT: &str = "SHOPFRONT_DB_CONNECT_TIMEOUT_SECS";

/// Where the shopfront database lives and how the pool around it behaves.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use shopfront_db::DbConfig;
///
/// let config = DbConfig::new("/var/lib/shopfront/shop.db")
///     .max_connections(8)
///     .connect_timeout(Duration::from_secs(10));
/// assert_eq!(config.max_connections, 8);
/// assert!(config.run_migrations);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first connect.
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// How long to wait for a free connection.
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    /// Apply embedded migrations when the pool opens.
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10 * 60),
            run_migrations: true,
        }
    }

    pub fn max_connections(self, max_connections: u32) -> Self {
        DbConfig { max_connections, ..self }
    }

    pub fn min_connections(self, min_connections: u32) -> Self {
        DbConfig { min_connections, ..self }
    }

    pub fn connect_timeout(self, connect_timeout: Duration) -> Self {
        DbConfig { connect_timeout, ..self }
    }

    pub fn run_migrations(self, run_migrations: bool) -> Self {
        DbConfig { run_migrations, ..self }
    }

    /// A private in-memory database for tests.
    ///
    /// The pool is pinned to one connection: every new connection to
    /// `:memory:` would otherwise see an empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            ..DbConfig::new(":memory:")
        }
    }

    /// Reads `SHOPFRONT_DB_*` variables; unset ones keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`] with the variables supplied by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup(ENV_PATH).unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        if path.trim().is_empty() {
            return Err(ConfigError::MissingRequired(ENV_PATH.to_string()));
        }

        let mut config = DbConfig::new(path);

        if let Some(max) = parse_var::<u32>(&lookup, ENV_MAX_CONNECTIONS)? {
            if max == 0 {
                return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
            }
            let min = config.min_connections.min(max);
            config = config.max_connections(max).min_connections(min);
        }

        if let Some(secs) = parse_var::<u64>(&lookup, ENV_CONNECT_TIMEOUT)? {
            config = config.connect_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue(key.to_string())))
        .transpose()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} has an invalid value")]
    InvalidValue(String),

    #[error("{0} must not be empty")]
    MissingRequired(String),
}

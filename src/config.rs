use std::{env, fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    MySql,
    Sqlite,
}

impl Backend {
    fn default_port(self) -> Option<u16> {
        match self {
            Backend::Postgres => Some(5432),
            Backend::MySql => Some(3306),
            Backend::Sqlite => None,
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            "mysql" => Ok(Backend::MySql),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown backend {other:?}")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Postgres => write!(f, "postgres"),
            Backend::MySql => write!(f, "mysql"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: Backend,
    /// Full connection URL; takes precedence over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub ssl: bool,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct GeoIpConfig {
    pub base_url: String,
    pub token: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database: DatabaseConfig,
    pub geoip: GeoIpConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend: Backend = parse_or(&var, "DB_BACKEND", Backend::Postgres)?;
        let url = var("DATABASE_URL");
        if backend == Backend::Sqlite && url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let database = DatabaseConfig {
            backend,
            url,
            host: var("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: match var("DB_PORT") {
                Some(_) => Some(parse_or(&var, "DB_PORT", 0u16)?),
                None => backend.default_port(),
            },
            user: var("DB_USER"),
            password: var("DB_PASSWORD"),
            name: var("DB_NAME"),
            ssl: parse_flag(&var, "DB_SSL")?,
            max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", 5)?,
        };

        let geoip = GeoIpConfig {
            base_url: var("GEOIP_BASE_URL").unwrap_or_else(|| "https://ipinfo.io".to_string()),
            token: var("IPINFO_TOKEN").unwrap_or_default(),
            timeout_secs: parse_or(&var, "GEOIP_TIMEOUT_SECS", 10)?,
        };

        Ok(Self {
            port: parse_or(&var, "PORT", 5000)?,
            database,
            geoip,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_flag<F>(var: &F, key: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = var(key) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "require" | "required" => Ok(true),
        "0" | "false" | "no" | "disable" | "disabled" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}

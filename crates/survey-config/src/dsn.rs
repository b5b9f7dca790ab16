//! DSN parsing for the two accepted connection string forms

use crate::loader::ConfigError;
use crate::validation::TCP_DSN_REGEX;
use sqlx::mysql::MySqlConnectOptions;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 3306;

/// Connection target parsed from a driver-form DSN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpDsn {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl TcpDsn {
    /// Parses `user:pass@tcp(host:port)/db?params`; query params are ignored.
    pub fn parse(dsn: &str) -> Option<Self> {
        let caps = TCP_DSN_REGEX.captures(dsn)?;
        let port = match caps.name("port") {
            Some(port) => port.as_str().parse().ok()?,
            None => DEFAULT_PORT,
        };
        Some(Self {
            user: caps["user"].to_string(),
            password: caps.name("pass").map(|m| m.as_str().to_string()).unwrap_or_default(),
            host: caps["host"].to_string(),
            port,
            database: caps["db"].to_string(),
        })
    }
}

/// Connect options from a `mysql://` URL or a driver-form DSN
pub fn connect_options_from_dsn(dsn: &str) -> Result<MySqlConnectOptions, ConfigError> {
    if let Some(tcp) = TcpDsn::parse(dsn) {
        return Ok(MySqlConnectOptions::new()
            .host(&tcp.host)
            .port(tcp.port)
            .database(&tcp.database)
            .username(&tcp.user)
            .password(&tcp.password)
            .charset("utf8mb4"));
    }

    MySqlConnectOptions::from_str(dsn).map_err(|e| ConfigError::InvalidDsn(e.to_string()))
}

/// `host:port/db` for a DSN, without credentials
pub fn describe_dsn(dsn: &str) -> String {
    if let Some(tcp) = TcpDsn::parse(dsn) {
        return format!("{}:{}/{}", tcp.host, tcp.port, tcp.database);
    }
    match url::Url::parse(dsn) {
        Ok(url) => format!(
            "{}:{}/{}",
            url.host_str().unwrap_or("localhost"),
            url.port().unwrap_or(DEFAULT_PORT),
            url.path().trim_start_matches('/')
        ),
        Err(_) => "<unparseable dsn>".to_string(),
    }
}

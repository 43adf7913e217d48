/*
 * Responsibility
 * - load settings from the environment (.env via dotenvy)
 * - validate them; missing or malformed values fail startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Staging,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub database_url: String,
    pub db_max_connections: u32,
    pub db_max_idle: Duration,
    // Bound on every single store round-trip.
    pub db_query_timeout: Duration,

    // Token lifetimes
    pub activation_token_ttl: chrono::Duration,
    pub authentication_token_ttl: chrono::Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // database_url may carry a password
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("database_url", &"<redacted>")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_max_idle", &self.db_max_idle)
            .field("db_query_timeout", &self.db_query_timeout)
            .field("activation_token_ttl", &self.activation_token_ttl)
            .field("authentication_token_ttl", &self.authentication_token_ttl)
            .finish()
    }
}

/// Parse `key` if set; fall back to `default` if unset; reject garbage.
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

fn positive_secs(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match parse_or(key, default)? {
        0 => Err(ConfigError::Invalid(key)),
        n => Ok(n),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_or("PORT", 4000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let db_max_connections: u32 = parse_or("DB_MAX_CONNECTIONS", 25)?;
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid("DB_MAX_CONNECTIONS"));
        }
        let db_max_idle = Duration::from_secs(positive_secs("DB_MAX_IDLE_SECONDS", 15 * 60)?);
        let db_query_timeout = Duration::from_secs(positive_secs("DB_QUERY_TIMEOUT_SECONDS", 3)?);

        let activation_token_ttl = chrono::Duration::seconds(
            positive_secs("ACTIVATION_TOKEN_TTL_SECONDS", 3 * 24 * 60 * 60)? as i64,
        );
        let authentication_token_ttl = chrono::Duration::seconds(
            positive_secs("AUTHENTICATION_TOKEN_TTL_SECONDS", 24 * 60 * 60)? as i64,
        );

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            database_url,
            db_max_connections,
            db_max_idle,
            db_query_timeout,
            activation_token_ttl,
            authentication_token_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_env_falls_back_to_development() {
        assert_eq!(AppEnv::parse("PROD"), AppEnv::Production);
        assert_eq!(AppEnv::parse("staging"), AppEnv::Staging);
        assert_eq!(AppEnv::parse("qa"), AppEnv::Development);
        assert_eq!(AppEnv::parse(""), AppEnv::Development);
    }

    #[test]
    fn config_error_names_the_key() {
        assert_eq!(
            ConfigError::Missing("DATABASE_URL").to_string(),
            "missing configuration: DATABASE_URL"
        );
    }
}

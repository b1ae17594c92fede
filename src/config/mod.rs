use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a session token, in hours.
    pub session_ttl_hours: i64,
}

static CONFIG: Lazy<AppConfig> = Lazy::new(|| AppConfig {
    environment: match env::var("FILM_CLUB_ENV").as_deref() {
        Ok("production") => Environment::Production,
        Ok("staging") => Environment::Staging,
        _ => Environment::Development,
    },
    database: DatabaseConfig {
        max_connections: env_parse("FILM_CLUB_MAX_CONNECTIONS", 10),
        connection_timeout_secs: env_parse("FILM_CLUB_CONNECT_TIMEOUT_SECS", 10),
    },
    auth: AuthConfig {
        session_ttl_hours: env_parse("FILM_CLUB_SESSION_TTL_HOURS", 24),
    },
});

/// Process-wide configuration, loaded from the environment on first access.
pub fn config() -> &'static AppConfig {
    &CONFIG
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

/// Server bind port, overridable for tests and deployments.
pub fn server_port() -> u16 {
    env::var("FILM_CLUB_PORT")
        .ok()
        .or_else(|| env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5555)
}

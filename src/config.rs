use std::{env, fmt, str::FromStr, time::Duration};

/// Runtime mode. Debug mode logs verbosely and exposes error details in
/// responses; release mode does neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEnv {
    Debug,
    Release,
}

impl AppEnv {
    pub fn is_debug(self) -> bool {
        self == AppEnv::Debug
    }
}

impl FromStr for AppEnv {
    type Err = std::convert::Infallible;

    // Anything other than "release" runs in debug mode.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim_matches(|c: char| c == '"' || c.is_whitespace());
        if normalized.eq_ignore_ascii_case("release") {
            Ok(AppEnv::Release)
        } else {
            Ok(AppEnv::Debug)
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEnv::Debug => f.write_str("debug"),
            AppEnv::Release => f.write_str("release"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub server_address: String,
    pub env: AppEnv,
    pub bcrypt_cost: u32,
    pub shutdown_grace: Duration,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            database_url: database_url_from_env()?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiry_hours: check_expiry_hours(parse_or("JWT_EXPIRY_HOURS", 24)?)?,
            server_address: env::var("SERVER_ADDRESS").unwrap_or_else(|_| {
                let port = env::var("APP_PORT").unwrap_or_else(|_| "8080".to_string());
                format!("0.0.0.0:{port}")
            }),
            env: env::var("SERVER_ENV")
                .unwrap_or_default()
                .parse()
                .unwrap_or(AppEnv::Debug),
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            shutdown_grace: Duration::from_secs(parse_or("SHUTDOWN_GRACE_SECS", 5)?),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Longest token lifetime accepted from the environment: one year.
pub const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 366;

fn check_expiry_hours(hours: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_JWT_EXPIRY_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(ConfigError::Invalid {
            name: "JWT_EXPIRY_HOURS",
            value: hours.to_string(),
        })
    }
}

// DATABASE_URL wins; otherwise the URL is assembled from the discrete DB_* variables.
fn database_url_from_env() -> Result<String, ConfigError> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return Ok(url);
    }

    let host = required("DB_HOST")?;
    let user = required("DB_USER")?;
    let password = env::var("DB_PASSWORD").unwrap_or_default();
    let name = required("DB_NAME")?;
    let port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());

    Ok(format!(
        "postgres://{user}:{password}@{host}:{port}/{name}?sslmode=disable"
    ))
}

use std::time::Duration;

use toko_core::AppError;
use toko_core::rate_limit::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW, RateLimitConfig};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_PREFIX: &str = "/api";
/// Four hours.
pub const DEFAULT_JWT_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// HTTP server settings, read from `TOKO_*` environment variables.
#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Mount point of the API routes; empty means the root.
    pub api_prefix: String,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub login_rate_limit: RateLimitConfig,
    /// Take the client address from `X-Forwarded-For` when present.
    pub trust_proxy: bool,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("api_prefix", &self.api_prefix)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("login_rate_limit", &self.login_rate_limit)
            .field("trust_proxy", &self.trust_proxy)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl ServerConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or("TOKO_SERVER_PORT", &lookup, DEFAULT_PORT)?;

        let api_prefix = normalize_prefix(
            lookup("TOKO_API_PREFIX")
                .as_deref()
                .unwrap_or(DEFAULT_API_PREFIX),
        )?;

        let jwt_secret = lookup("TOKO_JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("TOKO_JWT_SECRET must be set".into()))?;

        let jwt_ttl = Duration::from_secs(positive(
            "TOKO_JWT_TTL_SECS",
            parse_or("TOKO_JWT_TTL_SECS", &lookup, DEFAULT_JWT_TTL.as_secs())?,
        )?);

        let max_attempts = positive(
            "TOKO_LOGIN_MAX_ATTEMPTS",
            parse_or("TOKO_LOGIN_MAX_ATTEMPTS", &lookup, DEFAULT_MAX_ATTEMPTS)?,
        )?;
        let window = Duration::from_secs(positive(
            "TOKO_LOGIN_WINDOW_SECS",
            parse_or("TOKO_LOGIN_WINDOW_SECS", &lookup, DEFAULT_WINDOW.as_secs())?,
        )?);

        let trust_proxy = match lookup("TOKO_TRUST_PROXY") {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                AppError::ConfigError(format!("TOKO_TRUST_PROXY must be true or false, got '{raw}'"))
            })?,
        };

        let bcrypt_cost: u32 = parse_or("TOKO_BCRYPT_COST", &lookup, bcrypt_default_cost())?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(AppError::ConfigError(format!(
                "TOKO_BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}"
            )));
        }

        Ok(Self {
            port,
            api_prefix,
            jwt_secret,
            jwt_ttl,
            login_rate_limit: RateLimitConfig::new(max_attempts, window),
            trust_proxy,
            bcrypt_cost,
        })
    }

    /// Address to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// `bcrypt::DEFAULT_COST`, which the server crate does not link directly.
fn bcrypt_default_cost() -> u32 {
    toko_core::accounts::DEFAULT_HASH_COST
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("{key} has an invalid value: '{raw}'"))),
    }
}

fn positive<T>(key: &str, value: T) -> Result<T, AppError>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(AppError::ConfigError(format!(
            "{key} must be greater than 0, got {value}"
        )));
    }
    Ok(value)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `"api/"` becomes `"/api"`; `"/"` and `""` mean no prefix.
fn normalize_prefix(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.contains(['{', '}', '*', ' ']) {
        return Err(AppError::ConfigError(format!(
            "TOKO_API_PREFIX must be a plain path, got '{raw}'"
        )));
    }
    Ok(format!("/{trimmed}"))
}

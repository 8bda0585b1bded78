use std::env;
use std::fmt;

use chrono::Duration;

pub const MIN_SECRET_LEN: usize = 32;
/// One day.
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 24 * 60;
/// Ten years.
pub const MAX_REFRESH_TOKEN_DAYS: i64 = 3650;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_lifetime: Duration,
    pub refresh_token_lifetime: Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime", &self.refresh_token_lifetime)
            .finish()
    }
}

impl JwtConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "orders-api".into(),
            audience: "orders-api-clients".into(),
            access_token_lifetime: Duration::minutes(10),
            refresh_token_lifetime: Duration::days(7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub require_auth: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = lookup("SERVER_PORT").unwrap_or_else(|| "3000".into());
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let secret = lookup("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let mut jwt = JwtConfig::with_secret(secret);
        if let Some(issuer) = lookup("JWT_ISSUER") {
            jwt.issuer = issuer;
        }
        if let Some(audience) = lookup("JWT_AUDIENCE") {
            jwt.audience = audience;
        }
        if let Some(minutes) = lookup("JWT_ACCESS_TOKEN_MINUTES") {
            jwt.access_token_lifetime = parse_lifetime(
                "JWT_ACCESS_TOKEN_MINUTES",
                &minutes,
                MAX_ACCESS_TOKEN_MINUTES,
                Duration::try_minutes,
            )?;
        }
        if let Some(days) = lookup("JWT_REFRESH_TOKEN_DAYS") {
            jwt.refresh_token_lifetime = parse_lifetime(
                "JWT_REFRESH_TOKEN_DAYS",
                &days,
                MAX_REFRESH_TOKEN_DAYS,
                Duration::try_days,
            )?;
        }

        let require_auth = match lookup("REQUIRE_AUTH") {
            None => false,
            Some(v) => parse_bool("REQUIRE_AUTH", &v)?,
        };

        Ok(Self {
            server_port,
            database_url,
            jwt,
            require_auth,
        })
    }
}

fn parse_lifetime(
    key: &'static str,
    value: &str,
    max: i64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Invalid {
        key,
        reason: format!("expected an integer between 1 and {max}, got {value:?}"),
    };
    let n = value.trim().parse::<i64>().map_err(|_| invalid())?;
    if !(1..=max).contains(&n) {
        return Err(invalid());
    }
    unit(n).ok_or_else(invalid)
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got {value:?}"),
        }),
    }
}

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};

use crate::error::ConfigError;

pub const JWT_SECRET: &str = "JWT_SECRET";
pub const JWT_ACCESS_EXPIRATION: &str = "JWT_ACCESS_EXPIRATION";
pub const JWT_REFRESH_EXPIRATION: &str = "JWT_REFRESH_EXPIRATION";
pub const JWT_ISSUER: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE: &str = "JWT_AUDIENCE";
pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";

/// Signing secret used when `JWT_SECRET` is absent. Only fit for local runs.
pub const PLACEHOLDER_SECRET: &str = "change-me-in-production";
const DEFAULT_ACCESS_EXPIRATION: &str = "15m";
const DEFAULT_REFRESH_EXPIRATION: &str = "7d";
const DEFAULT_ISSUER: &str = "homeservices.sa";
const DEFAULT_AUDIENCE: &str = "homeservices-app";
const DEFAULT_PORT: u16 = 3000;

/// Token settings shared with whatever issues and verifies tokens.
///
/// Built once at startup and never mutated afterwards; hand it to consumers
/// explicitly rather than reading the environment again.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtConfig {
    secret: String,
    access_expiration: String,
    refresh_expiration: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: String,
    audience: String,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build the config from an arbitrary key lookup. Missing or empty values
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let secret = var(JWT_SECRET, PLACEHOLDER_SECRET);
        let access_expiration = var(JWT_ACCESS_EXPIRATION, DEFAULT_ACCESS_EXPIRATION);
        let refresh_expiration = var(JWT_REFRESH_EXPIRATION, DEFAULT_REFRESH_EXPIRATION);
        let access_ttl = parse_duration(JWT_ACCESS_EXPIRATION, &access_expiration)?;
        let refresh_ttl = parse_duration(JWT_REFRESH_EXPIRATION, &refresh_expiration)?;

        if secret == PLACEHOLDER_SECRET {
            tracing::warn!(
                "{JWT_SECRET} is not set, tokens will be signed with the placeholder secret"
            );
        }

        Ok(Self {
            secret,
            access_expiration,
            refresh_expiration,
            access_ttl,
            refresh_ttl,
            issuer: var(JWT_ISSUER, DEFAULT_ISSUER),
            audience: var(JWT_AUDIENCE, DEFAULT_AUDIENCE),
        })
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The access token lifetime as configured, e.g. `"15m"`.
    pub fn access_expiration(&self) -> &str {
        &self.access_expiration
    }

    pub fn refresh_expiration(&self) -> &str {
        &self.refresh_expiration
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.as_bytes())
    }

    /// HS256 validation with issuer and audience pinned to this config.
    pub fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_expiration", &self.access_expiration)
            .field("refresh_expiration", &self.refresh_expiration)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: PLACEHOLDER_SECRET.to_owned(),
            access_expiration: DEFAULT_ACCESS_EXPIRATION.to_owned(),
            refresh_expiration: DEFAULT_REFRESH_EXPIRATION.to_owned(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            issuer: DEFAULT_ISSUER.to_owned(),
            audience: DEFAULT_AUDIENCE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match lookup(HOST).filter(|value| !value.is_empty()) {
            Some(value) => value.parse::<IpAddr>().map_err(|_| ConfigError::InvalidValue {
                key: HOST,
                value,
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match lookup(PORT).filter(|value| !value.is_empty()) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue { key: PORT, value })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            bind: SocketAddr::new(host, port),
        })
    }
}

/// Everything the process reads from its environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            jwt: JwtConfig::from_lookup(&lookup)?,
            server: ServerConfig::from_lookup(&lookup)?,
        })
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse a lifetime such as `"900s"`, `"15m"` or `"7d"`.
///
/// Units are `ms`, `s`, `m`, `h`, `d` and `w`; a bare number is milliseconds.
pub fn parse_duration(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        key,
        value: value.to_owned(),
    };

    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let millis_per_unit: u64 = match unit {
        "" | "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        _ => return Err(invalid()),
    };

    amount
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}

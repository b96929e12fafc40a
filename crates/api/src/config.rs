//! Process configuration, read once at startup.

use chrono::Duration;
use thiserror::Error;

const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Argon2 cost parameters (memory KiB, iterations, lanes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Settings {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for Argon2Settings {
    fn default() -> Self {
        // argon2 0.5 defaults (OWASP minimum for argon2id).
        Self {
            m_cost: 19 * 1024,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub cookie_secure: bool,
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub argon2: Argon2Settings,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("session_ttl", &self.session_ttl)
            .field("reset_token_ttl", &self.reset_token_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("argon2", &self.argon2)
            .finish_non_exhaustive()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_SECRET.to_string(),
            session_ttl: Duration::minutes(60 * 24),
            reset_token_ttl: Duration::minutes(30),
            cookie_secure: true,
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            argon2: Argon2Settings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset and blank values use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                defaults.jwt_secret
            }
        };

        let minutes = |name: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match get(name) {
                None => Ok(default),
                Some(raw) => match raw.trim().parse::<i64>() {
                    Ok(m) if m > 0 => Ok(Duration::minutes(m)),
                    _ => Err(ConfigError::Invalid { name, value: raw }),
                },
            }
        };

        let cost = |name: &'static str, default: u32| -> Result<u32, ConfigError> {
            match get(name) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::Invalid { name, value: raw }),
            }
        };

        let cookie_secure = match get("COOKIE_SECURE") {
            None => defaults.cookie_secure,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "COOKIE_SECURE",
                        value: raw,
                    });
                }
            },
        };

        if !cookie_secure {
            tracing::warn!("COOKIE_SECURE disabled; session cookie will be sent over plain HTTP");
        }

        Ok(Self {
            jwt_secret,
            session_ttl: minutes("SESSION_TTL_MINUTES", defaults.session_ttl)?,
            reset_token_ttl: minutes("RESET_TOKEN_TTL_MINUTES", defaults.reset_token_ttl)?,
            cookie_secure,
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: get("DATABASE_URL"),
            argon2: Argon2Settings {
                m_cost: cost("ARGON2_M_COST", defaults.argon2.m_cost)?,
                t_cost: cost("ARGON2_T_COST", defaults.argon2.t_cost)?,
                p_cost: cost("ARGON2_P_COST", defaults.argon2.p_cost)?,
            },
        })
    }
}

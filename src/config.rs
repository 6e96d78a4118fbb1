use actix_web::cookie::Key;
use std::env;
use std::fmt;

const MIN_SECRET_KEY_LEN: usize = 32;

/// Cost bounds accepted by bcrypt.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.reason)
    }
}

impl std::error::Error for ConfigError {}

/// Session and password settings shared with handlers as `web::Data<AuthSettings>`.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub bcrypt_cost: u32,
    /// Lifetime of a login without "remember me".
    pub session_ttl: chrono::Duration,
    /// Lifetime of a "remember me" login, and of the session cookie itself.
    pub remember_ttl: chrono::Duration,
    pub cookie_secure: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            session_ttl: chrono::Duration::hours(24),
            remember_ttl: chrono::Duration::days(365),
            cookie_secure: false,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// Raw `SECRET_KEY`; `None` means a random key per process.
    pub secret_key: Option<String>,
    pub auth: AuthSettings,
}

fn parse<T: std::str::FromStr>(
    variable: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
            variable,
            reason: e.to_string(),
        }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AuthSettings::default();

        let bcrypt_cost = parse("BCRYPT_COST", lookup("BCRYPT_COST"), defaults.bcrypt_cost)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError {
                variable: "BCRYPT_COST",
                reason: format!(
                    "must be between {} and {}",
                    MIN_BCRYPT_COST,
                    MAX_BCRYPT_COST
                ),
            });
        }

        let session_hours: i64 = parse("SESSION_TTL_HOURS", lookup("SESSION_TTL_HOURS"), 24)?;
        let remember_days: i64 = parse("REMEMBER_DAYS", lookup("REMEMBER_DAYS"), 365)?;
        if session_hours <= 0 || remember_days <= 0 {
            return Err(ConfigError {
                variable: if session_hours <= 0 { "SESSION_TTL_HOURS" } else { "REMEMBER_DAYS" },
                reason: "must be positive".into(),
            });
        }

        let secret_key = lookup("SECRET_KEY").filter(|key| !key.is_empty());
        if let Some(key) = &secret_key {
            if key.len() < MIN_SECRET_KEY_LEN {
                return Err(ConfigError {
                    variable: "SECRET_KEY",
                    reason: format!("must be at least {} bytes", MIN_SECRET_KEY_LEN),
                });
            }
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://app.db".to_string()),
            server_port: parse("SERVER_PORT", lookup("SERVER_PORT"), 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            secret_key,
            auth: AuthSettings {
                bcrypt_cost,
                session_ttl: chrono::Duration::hours(session_hours),
                remember_ttl: chrono::Duration::days(remember_days),
                cookie_secure: parse("COOKIE_SECURE", lookup("COOKIE_SECURE"), false)?,
            },
        })
    }

    /// Cookie signing/encryption key. Without `SECRET_KEY`, sessions do not
    /// survive a restart.
    pub fn session_key(&self) -> Key {
        match &self.secret_key {
            Some(secret) => Key::derive_from(secret.as_bytes()),
            None => {
                log::warn!("SECRET_KEY is not set; generating a temporary session key");
                Key::generate()
            }
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.database_url, "sqlite://app.db");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
        assert!(config.secret_key.is_none());
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.auth.session_ttl, chrono::Duration::hours(24));
        assert_eq!(config.auth.remember_ttl, chrono::Duration::days(365));
        assert!(!config.auth.cookie_secure);
    }

    #[test]
    fn test_config_custom_values() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("SECRET_KEY", "0123456789abcdef0123456789abcdef"),
            ("BCRYPT_COST", "4"),
            ("SESSION_TTL_HOURS", "2"),
            ("REMEMBER_DAYS", "30"),
            ("COOKIE_SECURE", "true"),
        ])
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert_eq!(config.auth.session_ttl, chrono::Duration::hours(2));
        assert_eq!(config.auth.remember_ttl, chrono::Duration::days(30));
        assert!(config.auth.cookie_secure);
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        let err = config_from(&[("SERVER_PORT", "eighty")]).unwrap_err();
        assert_eq!(err.variable, "SERVER_PORT");

        let err = config_from(&[("SECRET_KEY", "default-dev-key")]).unwrap_err();
        assert_eq!(err.variable, "SECRET_KEY");

        let err = config_from(&[("BCRYPT_COST", "2")]).unwrap_err();
        assert_eq!(err.variable, "BCRYPT_COST");
        let err = config_from(&[("BCRYPT_COST", "32")]).unwrap_err();
        assert_eq!(err.variable, "BCRYPT_COST");
        assert!(config_from(&[("BCRYPT_COST", "4")]).is_ok());

        let err = config_from(&[("REMEMBER_DAYS", "0")]).unwrap_err();
        assert_eq!(err.variable, "REMEMBER_DAYS");
    }
}

//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

/// Scope tag carried by tokens issued at login.
pub const AUTHENTICATION_SCOPE: &str = "authentication";

/// Longest accepted `TOKEN_TTL_HOURS` (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// SQLx connection URL for the backing SQLite database
    pub database_url: String,
    /// Upper bound on pooled database connections
    pub database_max_connections: u32,
    /// Lifetime of newly issued bearer tokens
    pub token_ttl: chrono::Duration,
    /// How often expired tokens are swept; `None` disables the sweeper
    pub token_sweep_interval: Option<std::time::Duration>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            token_ttl: chrono::Duration::hours(24),
            token_sweep_interval: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let ttl_hours: i64 = parse_var("TOKEN_TTL_HOURS", 24)?;
        let token_ttl = (1..=MAX_TOKEN_TTL_HOURS)
            .contains(&ttl_hours)
            .then(|| chrono::Duration::try_hours(ttl_hours))
            .flatten()
            .ok_or_else(|| ConfigError::Invalid {
                var: "TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
            })?;

        let sweep_secs: u64 = parse_var("TOKEN_SWEEP_INTERVAL_SECS", 3600)?;

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://workouts.db?mode=rwc".to_string()),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            token_ttl,
            token_sweep_interval: (sweep_secs > 0)
                .then(|| std::time::Duration::from_secs(sweep_secs)),
        })
    }
}

/// Read `var` and parse it, falling back to `default` when unset.
fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("PORT", "9090");
        env::set_var("TOKEN_TTL_HOURS", "2");
        env::set_var("TOKEN_SWEEP_INTERVAL_SECS", "0");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 9090);
        assert_eq!(config.token_ttl, chrono::Duration::hours(2));
        assert!(config.token_sweep_interval.is_none());

        env::set_var("TOKEN_TTL_HOURS", "soon");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid {
                var: "TOKEN_TTL_HOURS",
                ..
            })
        ));

        for value in ["0", "-3", "8761", "9223372036854775807"] {
            env::set_var("TOKEN_TTL_HOURS", value);
            assert!(
                matches!(
                    Config::from_env(),
                    Err(ConfigError::Invalid {
                        var: "TOKEN_TTL_HOURS",
                        ..
                    })
                ),
                "TOKEN_TTL_HOURS={} must be rejected",
                value
            );
        }

        env::set_var("TOKEN_TTL_HOURS", "8760");
        assert_eq!(
            Config::from_env().unwrap().token_ttl,
            chrono::Duration::hours(MAX_TOKEN_TTL_HOURS)
        );

        env::remove_var("PORT");
        env::remove_var("TOKEN_TTL_HOURS");
        env::remove_var("TOKEN_SWEEP_INTERVAL_SECS");
    }
}

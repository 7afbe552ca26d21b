use std::path::PathBuf;

use crate::auth::jwt::{
    JwtConfig, DEFAULT_ACCESS_EXPIRY_MINS, DEFAULT_REFRESH_EXPIRY_DAYS, MAX_ACCESS_EXPIRY_MINS,
    MAX_REFRESH_EXPIRY_DAYS,
};

/// Configuration that could not be loaded from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Who may mint autologin tokens, and what site they point at.
#[derive(Debug, Clone, Default)]
pub struct AutologinConfig {
    /// Usernames allowed to call `POST /autologin`.
    pub allowed_creators: Vec<String>,
    /// Stamped into every issued autologin token as `site`.
    pub site: String,
}

impl AutologinConfig {
    pub fn is_allowed(&self, username: &str) -> bool {
        self.allowed_creators.iter().any(|allowed| allowed == username)
    }
}

/// Server configuration loaded once from environment variables.
///
/// Everything except the key paths has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests at shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Postgres URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Key locations and token expiry windows.
    pub jwt: JwtConfig,
    pub autologin: AutologinConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                    |
    /// | `DATABASE_URL`            | unset (in-memory)       |
    /// | `PRIVATE_KEY`             | **required**            |
    /// | `PUBLIC_KEY`              | **required**            |
    /// | `JWT_ACCESS_EXPIRY_MINS`  | `15`                    |
    /// | `JWT_REFRESH_EXPIRY_DAYS` | `7`                     |
    /// | `AUTOLOGIN_CREATE_USERS`  | empty                   |
    /// | `AUTOLOGIN_URL`           | empty                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "PORT", 3000u16)?;
        let cors_origins = split_list(
            &lookup("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:5173".into()),
        );
        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let shutdown_timeout_secs = parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30u64)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let jwt = JwtConfig {
            private_key_path: required_path(&lookup, "PRIVATE_KEY")?,
            public_key_path: required_path(&lookup, "PUBLIC_KEY")?,
            access_token_expiry_mins: parse_bounded(
                &lookup,
                "JWT_ACCESS_EXPIRY_MINS",
                DEFAULT_ACCESS_EXPIRY_MINS,
                MAX_ACCESS_EXPIRY_MINS,
            )?,
            refresh_token_expiry_days: parse_bounded(
                &lookup,
                "JWT_REFRESH_EXPIRY_DAYS",
                DEFAULT_REFRESH_EXPIRY_DAYS,
                MAX_REFRESH_EXPIRY_DAYS,
            )?,
        };

        let autologin = AutologinConfig {
            allowed_creators: split_list(&lookup("AUTOLOGIN_CREATE_USERS").unwrap_or_default()),
            site: lookup("AUTOLOGIN_URL").unwrap_or_default(),
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            database_url,
            jwt,
            autologin,
        })
    }
}

/// Comma-separated list with blanks trimmed and dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn required_path<F>(lookup: &F, var: &'static str) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::Missing(var))
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse a value in `1..=max`.
fn parse_bounded<F>(
    lookup: &F,
    var: &'static str,
    default: i64,
    max: i64,
) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, var, default)?;
    if !(1..=max).contains(&value) {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("must be between 1 and {max}"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;
    use crate::auth::jwt::TokenKind;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    const KEYS: [(&str, &str); 2] = [
        ("PRIVATE_KEY", "/keys/private.pem"),
        ("PUBLIC_KEY", "/keys/public.pem"),
    ];

    #[test]
    fn defaults_apply_when_only_keys_are_set() {
        let config = ServerConfig::from_lookup(lookup_from(&KEYS)).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.jwt.access_token_expiry_mins, 15);
        assert_eq!(config.jwt.refresh_token_expiry_days, 7);
        assert!(config.database_url.is_none());
        assert!(config.autologin.allowed_creators.is_empty());
        assert_eq!(config.jwt.private_key_path, PathBuf::from("/keys/private.pem"));
    }

    #[test]
    fn missing_key_path_is_an_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[("PUBLIC_KEY", "/k.pem")])).unwrap_err();
        assert_matches!(err, ConfigError::Missing("PRIVATE_KEY"));
    }

    #[test]
    fn allow_list_is_trimmed_and_blanks_dropped() {
        let mut pairs = KEYS.to_vec();
        pairs.push(("AUTOLOGIN_CREATE_USERS", " robot , ,ops-bot,"));
        pairs.push(("AUTOLOGIN_URL", "https://app.example"));
        let config = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.autologin.allowed_creators, vec!["robot", "ops-bot"]);
        assert!(config.autologin.is_allowed("robot"));
        assert!(!config.autologin.is_allowed(""));
        assert!(!config.autologin.is_allowed("Robot"));
        assert_eq!(config.autologin.site, "https://app.example");
    }

    #[test]
    fn invalid_numbers_are_reported_by_name() {
        let mut pairs = KEYS.to_vec();
        pairs.push(("PORT", "eighty"));
        let err = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "PORT", .. });

        let mut pairs = KEYS.to_vec();
        pairs.push(("JWT_ACCESS_EXPIRY_MINS", "0"));
        let err = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "JWT_ACCESS_EXPIRY_MINS", .. });
    }

    #[test]
    fn oversized_expiry_windows_are_rejected() {
        let mut pairs = KEYS.to_vec();
        pairs.push(("JWT_REFRESH_EXPIRY_DAYS", "9223372036854775807"));
        let err = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "JWT_REFRESH_EXPIRY_DAYS", .. });

        let mut pairs = KEYS.to_vec();
        pairs.push(("JWT_ACCESS_EXPIRY_MINS", "525601"));
        let err = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "JWT_ACCESS_EXPIRY_MINS", .. });

        let mut pairs = KEYS.to_vec();
        pairs.push(("JWT_REFRESH_EXPIRY_DAYS", "3650"));
        let config = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.jwt.window_secs(TokenKind::Refresh), 3650 * 24 * 60 * 60);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let mut pairs = KEYS.to_vec();
        pairs.push(("DATABASE_URL", "  "));
        let config = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(config.database_url.is_none());
    }
}

//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - PostgreSQL connection string
//! - `JWT_SECRET` - HS256 key shared with the identity provider
//!
//! ## Optional
//! - `SUPER_ADMIN_EMAILS` - comma-separated e-mails always granted the admin role
//! - `SERVER_HOST` - bind address (default: 0.0.0.0)
//! - `SERVER_PORT` - listen port (default: 3000)

use thiserror::Error;

/// Whole values that show a setting was copied from a template and never
/// filled in.
const PLACEHOLDER_VALUES: &[&str] = &[
    "secret",
    "jwt-secret",
    "jwt_secret",
    "changeme",
    "change-me",
    "placeholder",
    "example",
    "xxx",
    "todo",
];

/// Template prefixes such as `your-jwt-key-here` or `<secret>`.
const PLACEHOLDER_PREFIXES: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "change-me",
    "replace-me",
    "replace_me",
    "replace-with",
    "fill-in",
    "<",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Environment variable {0} still holds a placeholder value")]
    Placeholder(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub super_admin_emails: Vec<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns `None` for
    /// unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        if is_placeholder(&jwt_secret) {
            return Err(ConfigError::Placeholder("JWT_SECRET".to_string()));
        }

        let super_admin_emails = lookup("SUPER_ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("SERVER_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("SERVER_PORT".to_string(), e.to_string()))?,
            None => 3000,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            super_admin_emails,
            host,
            port,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn is_placeholder(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    PLACEHOLDER_VALUES.contains(&lower.as_str())
        || PLACEHOLDER_PREFIXES.iter().any(|p| lower.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_loads_with_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/pms"),
            ("JWT_SECRET", "k7Qw2mZ9vL4xR8tY"),
            ("SUPER_ADMIN_EMAILS", " Boss@Example.org , ,ops@firm.tw"),
        ]))
        .unwrap();
        assert_eq!(config.super_admin_emails, vec!["boss@example.org", "ops@firm.tw"]);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_missing_database_url_is_fatal() {
        let err = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "k7Qw2mZ9vL4xR8tY")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
    }

    #[test]
    fn test_placeholder_secret_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/pms"),
            ("JWT_SECRET", "your-jwt-key-here"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Placeholder("JWT_SECRET".to_string()));
    }

    #[test]
    fn test_bad_port() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/pms"),
            ("JWT_SECRET", "k7Qw2mZ9vL4xR8tY"),
            ("SERVER_PORT", "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SERVER_PORT"));
    }

    #[test]
    fn test_placeholder_detection_is_whole_value_or_prefix() {
        for value in ["secret", "ChangeMe", "your_jwt_secret", "<secret>", "replace-with-real-key"] {
            assert!(is_placeholder(value), "{value} should be rejected");
        }
        for value in ["prod-secret-9fA2xQ71", "k7Qw2mZ9vL4xR8tY", "example-corp-2f9Kq1"] {
            assert!(!is_placeholder(value), "{value} should be accepted");
        }

        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/pms"),
            ("JWT_SECRET", "prod-secret-9fA2xQ71"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_secret, "prod-secret-9fA2xQ71");
    }
}

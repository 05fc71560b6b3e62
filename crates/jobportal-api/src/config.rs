use std::path::PathBuf;

use jobportal_types::StatusPolicy;

/// Placeholder JWT secrets that MUST NOT be used.
pub const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JOBPORTAL_JWT_SECRET is unset or still a placeholder")]
    InsecureSecret,

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub cookie_secure: bool,
    pub status_policy: StatusPolicy,
    pub session_cleanup_secs: u64,
}

impl ApiConfig {
    /// | Variable                         | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `JOBPORTAL_HOST`                 | `0.0.0.0`               |
    /// | `JOBPORTAL_PORT`                 | `8000`                  |
    /// | `JOBPORTAL_DB_PATH`              | `jobportal.db`          |
    /// | `JOBPORTAL_JWT_SECRET`           | required                |
    /// | `JOBPORTAL_UPLOAD_DIR`           | `./uploads`             |
    /// | `JOBPORTAL_CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `JOBPORTAL_COOKIE_SECURE`        | `false`                 |
    /// | `JOBPORTAL_STATUS_POLICY`        | `compatible`            |
    /// | `JOBPORTAL_SESSION_CLEANUP_SECS` | `3600`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = std::env::var("JOBPORTAL_JWT_SECRET").unwrap_or_default();
        check_secret(&jwt_secret)?;

        Ok(Self {
            host: var_or("JOBPORTAL_HOST", "0.0.0.0"),
            port: parse_var("JOBPORTAL_PORT", 8000)?,
            db_path: var_or("JOBPORTAL_DB_PATH", "jobportal.db").into(),
            jwt_secret,
            upload_dir: var_or("JOBPORTAL_UPLOAD_DIR", "./uploads").into(),
            cors_origins: split_origins(&var_or("JOBPORTAL_CORS_ORIGINS", "http://localhost:5173")),
            cookie_secure: parse_var("JOBPORTAL_COOKIE_SECURE", false)?,
            status_policy: parse_var("JOBPORTAL_STATUS_POLICY", StatusPolicy::Compatible)?,
            session_cleanup_secs: parse_var("JOBPORTAL_SESSION_CLEANUP_SECS", 3600)?,
        })
    }
}

pub fn check_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.trim().is_empty() || PLACEHOLDER_SECRETS.contains(&secret) {
        return Err(ConfigError::InsecureSecret);
    }
    Ok(())
}

fn var_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.into())
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Secrets that ship in sample env files and must never reach a real deployment.
const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me", "changeme", "secret"];

/// Server configuration loaded from `JOBDESK_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub session_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let jwt_secret = std::env::var("JOBDESK_JWT_SECRET")
            .context("Required environment variable 'JOBDESK_JWT_SECRET' is not set")?;
        check_secret(&jwt_secret)?;

        let session_days = env_or("JOBDESK_SESSION_DAYS", "14")
            .parse::<i64>()
            .context("JOBDESK_SESSION_DAYS must be a whole number of days")?;
        if session_days < 1 {
            bail!("JOBDESK_SESSION_DAYS must be at least 1");
        }

        Ok(Config {
            jwt_secret,
            db_path: env_or("JOBDESK_DB_PATH", "jobdesk.db").into(),
            host: env_or("JOBDESK_HOST", "0.0.0.0"),
            port: env_or("JOBDESK_PORT", "8000")
                .parse::<u16>()
                .context("JOBDESK_PORT must be a valid port number")?,
            upload_dir: env_or("JOBDESK_UPLOAD_DIR", "./uploads").into(),
            session_days,
        })
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_days)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn check_secret(secret: &str) -> Result<()> {
    let trimmed = secret.trim();
    if trimmed.is_empty() || PLACEHOLDER_SECRETS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        bail!("JOBDESK_JWT_SECRET is unset or a placeholder; generate a random secret");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_secrets_are_refused() {
        for bad in ["", "   ", "dev-secret-change-me", "CHANGEME", "secret"] {
            assert!(check_secret(bad).is_err(), "{bad:?} should be refused");
        }
        assert!(check_secret("4f1c9e0b7a2d4c6e8f").is_ok());
    }
}

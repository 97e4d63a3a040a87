use crate::error::{PortalError, Result};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::info;

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password_sha256: String,
    pub session_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Without an API key checkouts go to the local sandbox.
    pub api_base: String,
    pub api_key: Option<String>,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Without an API URL emails are only logged.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    pub admin_notify: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub public_url: String,
    pub cors_origin: Option<String>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub admin: AdminConfig,
    pub webhook_secret: String,
    pub gateway: GatewayConfig,
    pub mail: MailConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let password_sha256 = vars.required("ADMIN_PASSWORD_SHA256")?.to_ascii_lowercase();
        if password_sha256.len() != 64 || !password_sha256.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PortalError::ConfigError(
                "ADMIN_PASSWORD_SHA256 must be a hex SHA-256 digest (see `asb-portal hash-password`)"
                    .to_string(),
            ));
        }

        Ok(Self {
            port: vars.parsed("PORT", 8080)?,
            public_url: vars.or("PUBLIC_URL", "http://localhost:5173"),
            cors_origin: vars.optional("CORS_ORIGIN"),
            upload_dir: PathBuf::from(vars.or("UPLOAD_DIR", "uploads")),
            max_upload_bytes: vars.parsed("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            admin: AdminConfig {
                username: vars.or("ADMIN_USERNAME", "admin"),
                password_sha256,
                session_ttl_secs: vars.parsed("SESSION_TTL_SECS", 8 * 60 * 60)?,
            },
            webhook_secret: vars.required("WEBHOOK_SECRET")?,
            gateway: GatewayConfig {
                api_base: vars.or("GATEWAY_API_BASE", "https://api.payments.example.com/v1"),
                api_key: vars.optional("GATEWAY_API_KEY"),
                currency: vars.or("CURRENCY", "usd").to_ascii_lowercase(),
            },
            mail: MailConfig {
                api_url: vars.optional("MAIL_API_URL"),
                api_key: vars.optional("MAIL_API_KEY"),
                from: vars.or("MAIL_FROM", "ASB <asb@localhost>"),
                admin_notify: vars.optional("ADMIN_NOTIFY_EMAIL"),
            },
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| PortalError::ConfigError(format!("{key} must be set")))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e| PortalError::ConfigError(format!("Invalid {key} value {raw}: {e}"))),
            None => {
                info!("{key} not set, using default: {default}");
                Ok(default)
            }
        }
    }
}

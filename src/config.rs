//! Configuration
//!
//! Layered: built-in defaults, then `config/default.toml` and
//! `config/local.toml`, then `MODAM__*` environment variables on top.
//! Validated once at load.

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub cloudflare: CloudflareConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub diagnosis: DiagnosisConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind, e.g. "0.0.0.0"
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public domain (e.g., "modam.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Public base URL, e.g. "https://modam.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// SQLite database location
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database file; created (with parent directories) on first run
    pub path: PathBuf,
}

/// Storage configuration (Cloudflare R2)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket for community post images
    pub community: BucketConfig,
    /// Bucket for profile avatars
    pub avatars: BucketConfig,
}

/// A single R2 bucket with its public custom domain
#[derive(Debug, Clone, Deserialize)]
pub struct BucketConfig {
    /// R2 bucket name
    pub bucket: String,
    /// Public URL for the bucket (Custom Domain)
    /// e.g., "https://images.example.com"
    pub public_url: String,
}

/// Cloudflare credentials
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareConfig {
    /// Cloudflare account ID
    pub account_id: String,
    /// R2 access key ID
    pub r2_access_key_id: String,
    /// R2 secret access key
    pub r2_secret_access_key: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session secret key (32+ bytes)
    pub session_secret: String,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    /// Upper bound for session recovery at startup of a client
    /// session, in seconds; on timeout the caller proceeds anonymous
    #[serde(default = "default_session_recover_timeout")]
    pub session_recover_timeout: u64,
}

fn default_session_recover_timeout() -> u64 {
    5
}

/// Platform admin configuration
///
/// The admin is detected by username equality against `username`;
/// their posts and comments are labeled with `nickname`.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Reserved admin username (default: "modamadmin")
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Display label substituted for the admin (default: "Modam Admin")
    #[serde(default = "default_admin_nickname")]
    pub nickname: String,
}

fn default_admin_username() -> String {
    "modamadmin".to_string()
}

fn default_admin_nickname() -> String {
    "Modam Admin".to_string()
}

/// Mock diagnosis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisConfig {
    /// Simulated analysis latency in milliseconds (default: 3500)
    pub analysis_delay_ms: u64,
    /// Path of the local JSON ledger file
    pub ledger_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, or error
    pub level: String,
    /// "pretty" for development, "json" for shipping to a collector
    pub format: String,
}

impl AppConfig {
    /// Load and validate the configuration.
    ///
    /// Later sources win: defaults < config/default.toml <
    /// config/local.toml < `MODAM__*` environment variables. Both
    /// files are optional.
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let loaded = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.protocol", "http")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("auth.session_recover_timeout", 5)?
            .set_default("admin.username", "modamadmin")?
            .set_default("admin.nickname", "Modam Admin")?
            .set_default("diagnosis.analysis_delay_ms", 3500)?
            .set_default("diagnosis.ledger_path", "data/diagnoses.json")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("MODAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let parsed: Self = loaded
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Whether the session cookie should carry the Secure attribute.
    ///
    /// Only a plain-http server on a local domain gets insecure
    /// cookies; everything else does.
    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SESSION_SECRET_BYTES: usize = 32;

        let fail = |message: String| Err(crate::error::AppError::Config(message));

        if self.auth.session_secret.as_bytes().len() < MIN_SESSION_SECRET_BYTES {
            return fail(format!(
                "auth.session_secret must be at least {MIN_SESSION_SECRET_BYTES} bytes"
            ));
        }
        if self.auth.session_max_age <= 0 {
            return fail("auth.session_max_age must be greater than 0".to_string());
        }
        if self.admin.username.trim().is_empty() {
            return fail("admin.username must not be empty".to_string());
        }

        if !self.should_use_secure_cookies() {
            tracing::warn!(
                host = %server_host(&self.server.domain),
                protocol = %self.server.protocol,
                "Using insecure session cookies for local development"
            );
        } else if !self.server.protocol.eq_ignore_ascii_case("https") {
            return fail("server.protocol must be https for non-local server domains".to_string());
        }

        Ok(())
    }
}

/// Lower-cased host part of the configured domain (which may carry a
/// port).
fn server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| trimmed.to_string())
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(ip) => ip.is_loopback() || ip.is_unspecified(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/modam-test.db"),
            },
            storage: StorageConfig {
                community: BucketConfig {
                    bucket: "community".to_string(),
                    public_url: "https://images.example.com".to_string(),
                },
                avatars: BucketConfig {
                    bucket: "avatars".to_string(),
                    public_url: "https://avatars.example.com".to_string(),
                },
            },
            cloudflare: CloudflareConfig {
                account_id: "account".to_string(),
                r2_access_key_id: "access-key".to_string(),
                r2_secret_access_key: "secret-key".to_string(),
            },
            auth: AuthConfig {
                session_secret: "x".repeat(32),
                session_max_age: 604_800,
                session_recover_timeout: 5,
            },
            admin: AdminConfig {
                username: "modamadmin".to_string(),
                nickname: "Modam Admin".to_string(),
            },
            diagnosis: DiagnosisConfig {
                analysis_delay_ms: 0,
                ledger_path: PathBuf::from("/tmp/modam-diagnoses.json"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_http_on_localhost() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert!(!config.should_use_secure_cookies());
    }

    #[test]
    fn validate_rejects_short_session_secret() {
        let mut config = valid_config();
        config.auth.session_secret = "short-secret".to_string();

        let error = config
            .validate()
            .expect_err("session secret shorter than 32 bytes must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.session_secret")
        ));
    }

    #[test]
    fn validate_rejects_http_for_non_local_domain() {
        let mut config = valid_config();
        config.server.domain = "modam.example.com".to_string();
        config.server.protocol = "http".to_string();

        let error = config
            .validate()
            .expect_err("public domains must require https");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("server.protocol must be https")
        ));
    }
}

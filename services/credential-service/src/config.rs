//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The JWT signing secret is loaded from the JWT_SECRET env var or
//! `jwt.secret_file`, never stored in the TOML directly.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use token_auth::{
    DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_REFRESH_TOKEN_TTL, MAX_ACCESS_TOKEN_TTL,
    MAX_REFRESH_TOKEN_TTL, RECOMMENDED_SECRET_BYTES,
};
use tracing::warn;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// Listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Token issuance settings
#[derive(Debug, Deserialize)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    #[serde(skip)]
    pub secret: Option<Secret<Vec<u8>>>,
    /// Path to a file containing the signing secret (alternative to JWT_SECRET)
    #[serde(default)]
    pub secret_file: Option<PathBuf>,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_token_ttl_minutes: u64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_token_ttl_days: u64,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// A login the service accepts. Only the hex SHA-256 of the password is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub password_sha256: String,
}

fn default_max_connections() -> usize {
    1000
}

fn default_access_ttl_minutes() -> u64 {
    DEFAULT_ACCESS_TOKEN_TTL.as_secs() / 60
}

fn default_refresh_ttl_days() -> u64 {
    DEFAULT_REFRESH_TOKEN_TTL.as_secs() / SECS_PER_DAY
}

fn default_sweep_interval() -> u64 {
    60
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_minutes.saturating_mul(60))
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_days.saturating_mul(SECS_PER_DAY))
    }
}

impl StoreConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Secret resolution order:
    /// 1. JWT_SECRET env var
    /// 2. secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if config.server.listen_addr == config.server.admin_addr {
            return Err(common::Error::Config(format!(
                "listen_addr and admin_addr must differ, both are {}",
                config.server.listen_addr
            )));
        }

        if config.jwt.access_token_ttl_minutes == 0 {
            return Err(common::Error::Config(
                "access_token_ttl_minutes must be greater than 0".into(),
            ));
        }

        if config.jwt.refresh_token_ttl_days == 0 {
            return Err(common::Error::Config(
                "refresh_token_ttl_days must be greater than 0".into(),
            ));
        }

        if config.jwt.access_ttl() > MAX_ACCESS_TOKEN_TTL {
            return Err(common::Error::Config(format!(
                "access_token_ttl_minutes must be at most {}",
                MAX_ACCESS_TOKEN_TTL.as_secs() / 60
            )));
        }

        if config.jwt.refresh_ttl() > MAX_REFRESH_TOKEN_TTL {
            return Err(common::Error::Config(format!(
                "refresh_token_ttl_days must be at most {}",
                MAX_REFRESH_TOKEN_TTL.as_secs() / SECS_PER_DAY
            )));
        }

        if config.store.sweep_interval_secs == 0 {
            return Err(common::Error::Config(
                "sweep_interval_secs must be greater than 0".into(),
            ));
        }

        for user in &mut config.users {
            if user.username.is_empty() {
                return Err(common::Error::Config("username must not be empty".into()));
            }
            user.password_sha256.make_ascii_lowercase();
            if user.password_sha256.len() != 64
                || !user.password_sha256.bytes().all(|b| b.is_ascii_hexdigit())
            {
                return Err(common::Error::Config(format!(
                    "password_sha256 for {} must be 64 hex characters",
                    user.username
                )));
            }
        }

        // Env var takes precedence over file; an empty JWT_SECRET counts as unset
        match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => {
                config.jwt.secret = Some(Secret::from(secret));
            }
            _ => {
                if let Some(ref secret_file) = config.jwt.secret_file {
                    let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                        common::Error::Config(format!(
                            "failed to read secret_file {}: {e}",
                            secret_file.display()
                        ))
                    })?;
                    let secret = secret.trim().to_owned();
                    if !secret.is_empty() {
                        config.jwt.secret = Some(Secret::from(secret));
                    }
                }
            }
        }

        match config.jwt.secret {
            None => {
                return Err(common::Error::Config(
                    "no signing secret: set JWT_SECRET or jwt.secret_file".into(),
                ));
            }
            Some(ref secret) if secret.len() < RECOMMENDED_SECRET_BYTES => {
                warn!(
                    secret_bytes = secret.len(),
                    recommended = RECOMMENDED_SECRET_BYTES,
                    "JWT signing secret is shorter than recommended"
                );
            }
            Some(_) => {}
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("credential-service.toml")
    }
}

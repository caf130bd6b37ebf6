//! Service settings loaded from the environment

use std::path::PathBuf;

use anyhow::Result;
use auth::RateLimiterConfig;
use config::{Config, Environment};
use serde::Deserialize;

/// Which backend holds the tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

/// Settings for the booking API service
///
/// # Environment Variables
/// - `HOST`: Bind address (default: "0.0.0.0")
/// - `PORT`: Bind port (default: 8000)
/// - `STORE_BACKEND`: `memory` or `postgres` (default: "memory")
/// - `SEED_FILE`: JSON file of users and hotel rooms to provision at startup
/// - `SESSION_SWEEP_INTERVAL`: Seconds between expired-session sweeps (default: 60)
/// - `LOGIN_MAX_ATTEMPTS`: Failed sign-ins before lockout (default: 5)
/// - `LOGIN_WINDOW_SECONDS`: Window for counting failures (default: 300)
/// - `LOGIN_BAN_SECONDS`: Lockout duration (default: 900)
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub seed_file: Option<PathBuf>,
    pub session_sweep_interval: u64,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    pub login_ban_seconds: u64,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(Environment::default().try_parsing(true))
    }

    fn load(environment: Environment) -> Result<Self> {
        let config = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("store_backend", "memory")?
            .set_default("session_sweep_interval", 60)?
            .set_default("login_max_attempts", 5)?
            .set_default("login_window_seconds", 300)?
            .set_default("login_ban_seconds", 900)?
            .add_source(environment)
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_attempts: self.login_max_attempts,
            window_seconds: self.login_window_seconds,
            ban_duration_seconds: self.login_ban_seconds,
        }
    }
}

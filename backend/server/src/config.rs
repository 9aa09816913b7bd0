use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

const SECRETS_DIR: &str = "/run/secrets";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_collection: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            mongo_uri: load_secret("MONGO_URI", "mongodb://localhost:27017"),
            mongo_database: try_load("MONGO_DATABASE", "follooow")?,
            mongo_collection: try_load("MONGO_COLLECTION", "influencers")?,
            request_timeout: Duration::from_secs(try_load("REQUEST_TIMEOUT_SECS", "10")?),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_database: "follooow".to_string(),
            mongo_collection: "influencers".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    parse_or_default(key, var(key), default)
}

fn parse_or_default<T: FromStr>(key: &str, raw: Option<String>, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let value = raw.unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow!("environment misconfigured: {key}={value:?} ({e})")
    })
}

/// Secret file first, then the environment, then the default.
fn load_secret(secret_name: &str, default: &str) -> String {
    let path = format!("{SECRETS_DIR}/{secret_name}");

    match read_secret(&path) {
        Ok(secret) => secret,
        Err(e) => {
            info!("{e:#}, falling back to environment");
            var(secret_name).unwrap_or_else(|| {
                warn!("{secret_name} not found, using default");
                default.to_string()
            })
        }
    }
}

fn read_secret(path: &str) -> Result<String> {
    read_to_string(path)
        .map(|s| s.trim().to_string())
        .with_context(|| format!("failed to read secret {path}"))
}

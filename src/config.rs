use std::{env, fmt::Display, net::IpAddr, path::PathBuf, str::FromStr};

use chrono_tz::Tz;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::{error::AppError, timing::refresh::STANDARD_REFRESH_SECS};

/// Process-wide settings, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
    pub timezone: Tz,
    pub refresh_interval: Duration,
    pub seed_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `load` but reads values through `lookup` instead of the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let refresh_secs: u64 = try_load(&lookup, "REFRESH_INTERVAL_SECS", &STANDARD_REFRESH_SECS.to_string())?;
        if refresh_secs == 0 {
            return Err(AppError::Config {
                key: "REFRESH_INTERVAL_SECS",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            bind_address: try_load(&lookup, "BIND_ADDR", "127.0.0.1")?,
            port: try_load(&lookup, "PORT", "7878")?,
            database_path: try_load(&lookup, "DATABASE_PATH", "data.db")?,
            timezone: try_load(&lookup, "TIMEZONE", "Europe/London")?,
            refresh_interval: Duration::from_secs(refresh_secs),
            seed_file: lookup("SEED_FILE")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.trim().parse().map_err(|err: T::Err| {
        warn!("Invalid {key} value: {err}");
        AppError::Config {
            key,
            message: err.to_string(),
        }
    })
}

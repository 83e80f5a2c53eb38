//! Start-up configuration read from `CAREHOME_*` environment variables.

use std::net::SocketAddr;

use anyhow::{anyhow, Context};
use carehome_core::medications::DEFAULT_TIMING_WINDOW_MINUTES;
use carehome_core::security::RootKey;
use carehome_core::sync::SYNC_WORKER_INTERVAL_SECS;
use chrono_tz::Tz;

const DEFAULT_DB_PATH: &str = "./data";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8088";

#[derive(Debug, Clone)]
pub struct Config {
    /// Database file, or a directory that gets `carehome.db` appended.
    pub db_path: String,
    pub listen_addr: SocketAddr,
    /// Central server root. Without it queued items stay queued.
    pub sync_api_url: Option<String>,
    pub sync_token: Option<String>,
    /// Root key for at-rest signature encryption (base64, 32 bytes).
    pub secret_key: RootKey,
    pub require_pin: bool,
    pub sync_interval_secs: u64,
    pub timing_window_minutes: i64,
    /// Zone the schedule times are written in (IANA name, default UTC).
    pub timezone: Tz,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let listen_addr = get("CAREHOME_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("CAREHOME_LISTEN_ADDR is not a socket address")?;

        let secret_key = get("CAREHOME_SECRET_KEY")
            .ok_or_else(|| anyhow!("CAREHOME_SECRET_KEY must be set (base64, 32 bytes)"))
            .and_then(|encoded| RootKey::from_base64(&encoded).map_err(|e| anyhow!(e)))?;

        let require_pin = match get("CAREHOME_REQUIRE_PIN").as_deref() {
            None => false,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => return Err(anyhow!("CAREHOME_REQUIRE_PIN must be true or false, got {}", v)),
        };

        let sync_interval_secs = get("CAREHOME_SYNC_INTERVAL_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("CAREHOME_SYNC_INTERVAL_SECS is not a number")?
            .unwrap_or(SYNC_WORKER_INTERVAL_SECS)
            .max(1);

        let timing_window_minutes = get("CAREHOME_TIMING_WINDOW_MINUTES")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("CAREHOME_TIMING_WINDOW_MINUTES is not a number")?
            .unwrap_or(DEFAULT_TIMING_WINDOW_MINUTES);

        let timezone = match get("CAREHOME_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| anyhow!("CAREHOME_TIMEZONE is not an IANA zone name: {}", name))?,
            None => chrono_tz::UTC,
        };

        Ok(Self {
            db_path: get("CAREHOME_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            listen_addr,
            sync_api_url: get("CAREHOME_SYNC_API_URL").map(|v| v.trim_end_matches('/').to_string()),
            sync_token: get("CAREHOME_SYNC_TOKEN"),
            secret_key,
            require_pin,
            sync_interval_secs,
            timing_window_minutes,
            timezone,
        })
    }
}

use crate::error::{PortalError, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_AUTH_ENDPOINT: &str = "http://localhost:3001/api/login";
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);
const STORAGE_FILE_NAME: &str = "local-storage.json";

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Directory holding the persisted key-value store.
    pub data_dir: PathBuf,
    /// Login endpoint receiving `POST {username, password}`.
    pub auth_endpoint: Url,
    /// Replaces the built-in catalog when set.
    pub catalog_path: Option<PathBuf>,
    /// Simulated suggestion latency bounds, in milliseconds.
    pub suggestion_delay_ms: (u64, u64),
    /// How long a login request may wait for the endpoint to answer.
    pub login_timeout: Duration,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var_os("VALUECENT_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()
                .map_err(|e| PortalError::Config(format!("cannot resolve current_dir: {e}")))?
                .join(".valuecent"),
        };

        let auth_endpoint = std::env::var("VALUECENT_AUTH_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_AUTH_ENDPOINT.to_string());
        let auth_endpoint = parse_endpoint(&auth_endpoint)?;

        let catalog_path = std::env::var_os("VALUECENT_CATALOG").map(PathBuf::from);

        let suggestion_delay_ms = match std::env::var("VALUECENT_SUGGESTION_DELAY_MS") {
            Ok(raw) => parse_delay(&raw)?,
            Err(_) => (500, 1000),
        };

        let login_timeout = match std::env::var("VALUECENT_LOGIN_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_LOGIN_TIMEOUT,
        };

        Ok(Self {
            data_dir,
            auth_endpoint,
            catalog_path,
            suggestion_delay_ms,
            login_timeout,
        })
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE_NAME)
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| PortalError::Config(format!("auth endpoint '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PortalError::Config(format!(
            "auth endpoint must be http or https, got '{other}'"
        ))),
    }
}

/// Parses `"<min>-<max>"` or a single fixed value.
pub fn parse_delay(raw: &str) -> Result<(u64, u64)> {
    let invalid = || PortalError::Config(format!("suggestion delay '{raw}' is not '<min>-<max>'"));
    let parse = |s: &str| s.trim().parse::<u64>().map_err(|_| invalid());

    match raw.split_once('-') {
        Some((min, max)) => Ok((parse(min)?, parse(max)?)),
        None => {
            let fixed = parse(raw)?;
            Ok((fixed, fixed))
        }
    }
}

/// Parses a whole number of seconds greater than zero.
pub fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(PortalError::Config(format!(
            "login timeout '{raw}' is not a positive number of seconds"
        ))),
    }
}

//! Minimal runtime configuration helpers.
//! Defaults target the production portal.

use std::time::Duration;
use std::{fs, path::Path};

use crate::client::{BASE_URL, ClientOptions, Credentials, DEFAULT_TIMEOUT};
use crate::models::sector_alarm::PanelId;

pub const PASSWORD_FILE: &str = "password.txt";

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Portal root; overridable for staging or local testing.
    pub base_url: String,
    /// Per-request timeout; `SECTORALARM_TIMEOUT_SECS=0` disables it.
    pub timeout: Option<Duration>,
    /// Panel to query when the command line does not name one.
    pub panel_id: Option<PanelId>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let user_id = non_empty("SECTORALARM_USER_ID")
            .ok_or_else(|| "Missing user id: set SECTORALARM_USER_ID".to_string())?;

        // Prefer env var; fallback to password.txt in working directory
        let password = match lookup("SECTORALARM_PASSWORD") {
            Some(v) if !v.is_empty() => v,
            _ => match fs::read_to_string(Path::new(PASSWORD_FILE)) {
                Ok(s) if !s.trim().is_empty() => s.trim_end_matches(['\r', '\n']).to_string(),
                _ => {
                    return Err(format!(
                        "Missing password: set SECTORALARM_PASSWORD or provide {} in working directory",
                        PASSWORD_FILE
                    ));
                }
            },
        };

        let base_url = non_empty("SECTORALARM_BASE_URL").unwrap_or_else(|| BASE_URL.to_string());
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(format!("SECTORALARM_BASE_URL must be an http(s) URL, got {}", base_url));
        }

        let timeout = match non_empty("SECTORALARM_TIMEOUT_SECS") {
            None => Some(DEFAULT_TIMEOUT),
            Some(s) => match s.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => return Err("SECTORALARM_TIMEOUT_SECS must be a whole number of seconds".to_string()),
            },
        };

        let panel_id = non_empty("SECTORALARM_PANEL_ID").map(PanelId);

        Ok(Config {
            credentials: Credentials::new(user_id, password),
            base_url,
            timeout,
            panel_id,
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
        }
    }
}

//! Version token discovery.
//!
//! The portal has no endpoint that reports its version; the only place the token appears is the
//! script reference on the landing page (`"/Scripts/main.js?v<TOKEN>"`). Data calls must echo it
//! back, so login scrapes it once and the client caches it.

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use crate::client::SectorAlarmError;
use crate::models::sector_alarm::VersionToken;

static MAIN_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""/Scripts/main\.js\?(v[A-Z0-9_]*)""#).expect("static regex is valid")
});

/// Obtains the current version token for a session.
///
/// Called once per successful login, on the same agent so any cookies the lookup receives join
/// the session.
pub trait VersionSource: Send + Sync {
    fn fetch_version(&self, agent: &ureq::Agent, base_url: &str) -> Result<VersionToken, SectorAlarmError>;
}

/// Scrapes the token from the portal's landing page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LandingPage;

impl VersionSource for LandingPage {
    fn fetch_version(&self, agent: &ureq::Agent, base_url: &str) -> Result<VersionToken, SectorAlarmError> {
        let url = format!("{}/", base_url.trim_end_matches('/'));
        let mut resp = agent.get(&url).header("Accept", "text/html").call()?;
        debug!("Landing page responded with {}", resp.status());

        let body = resp.body_mut().read_to_string()?;
        extract_version(&body)
            .map(|v| VersionToken(v.to_string()))
            .ok_or(SectorAlarmError::UnexpectedPageFormat)
    }
}

/// Find the version marker in landing page markup, e.g. `vAB12_CD` in `"/Scripts/main.js?vAB12_CD"`.
pub fn extract_version(html: &str) -> Option<&str> {
    MAIN_SCRIPT_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

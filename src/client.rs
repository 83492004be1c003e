//! Blocking HTTP client for the Sector Alarm customer portal.
//!
//! - Blocking client using `ureq` (no async).
//! - Uses the models in `crate::models::sector_alarm`.
//! - Covers the read endpoints: panel list, overview and temperatures.
//!
//! Session
//! - `login` posts the credentials as a form and expects a 302; redirects are never followed so
//!   the status stays observable.
//! - The agent's cookie store keeps whatever the portal sets and replays it on every later call.
//! - After login the version token is fetched once (see `crate::version`) and echoed in every
//!   POST body. There is no refresh; a client holds one session for its lifetime.

use http::StatusCode;
use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::models::sector_alarm::*;
use crate::version::{LandingPage, VersionSource};

pub const BASE_URL: &str = "https://mypagesapi.sectoralarm.net";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const LOGIN_PATH: &str = "/User/Login";
const PANEL_LIST_PATH: &str = "/Panel/GetPanelList/";
const OVERVIEW_PATH: &str = "/Panel/GetOverview/";
// Vendor spelling.
const TEMPERATURES_PATH: &str = "/Panel/GetTempratures/";

#[derive(Debug)]
pub enum SectorAlarmError {
    /// Connect, DNS, TLS or protocol failure below HTTP.
    Transport(ureq::Error),
    /// I/O failure while reading a response body.
    Io(std::io::Error),
    /// Login answered with something other than a redirect.
    LoginRejected { status: u16 },
    /// The landing page no longer carries the version marker.
    UnexpectedPageFormat,
    /// A data endpoint answered with a non-success status. `status_text` is built from the code's
    /// canonical reason phrase (e.g. "500 Internal Server Error"), not the server's own wording.
    Http { status: u16, status_text: String },
    /// The body did not decode into the expected model.
    MalformedResponse {
        endpoint: &'static str,
        path: String,
        source: serde_json::Error,
    },
}

impl core::fmt::Display for SectorAlarmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SectorAlarmError::Transport(e) => write!(f, "transport error: {}", e),
            SectorAlarmError::Io(e) => write!(f, "transport error: {}", e),
            SectorAlarmError::LoginRejected { status } => {
                write!(f, "login rejected: expected redirect, got http {}", status)
            }
            SectorAlarmError::UnexpectedPageFormat => {
                write!(f, "unexpected page format: version token not found on landing page")
            }
            SectorAlarmError::Http { status_text, .. } => write!(f, "http {}", status_text),
            SectorAlarmError::MalformedResponse { endpoint, path, source } => {
                write!(f, "malformed response from {} at `{}`: {}", endpoint, path, source)
            }
        }
    }
}

impl std::error::Error for SectorAlarmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SectorAlarmError::Transport(e) => Some(e),
            SectorAlarmError::Io(e) => Some(e),
            SectorAlarmError::MalformedResponse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ureq::Error> for SectorAlarmError {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::Io(e) => SectorAlarmError::Io(e),
            other => SectorAlarmError::Transport(other),
        }
    }
}

/// Account credentials. The password is kept out of `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    pub user_id: String,
    password: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            user_id: user_id.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    /// Global per-request timeout; `None` blocks until the server answers.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            base_url: BASE_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

#[derive(Serialize)]
struct PanelRequest<'a> {
    id: &'a str,
    #[serde(rename = "Version")]
    version: &'a str,
}

pub struct SectorAlarmClient {
    agent: ureq::Agent,
    base_url: String,
    credentials: Credentials,
    version: Option<VersionToken>,
    version_source: Box<dyn VersionSource>,
}

impl SectorAlarmClient {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_options(Credentials::new(user_id, password), ClientOptions::default())
    }

    pub fn with_options(credentials: Credentials, options: ClientOptions) -> Self {
        let config = ureq::Agent::config_builder()
            .max_redirects(0)
            .max_redirects_will_error(false)
            .http_status_as_error(false)
            .timeout_global(options.timeout)
            .build();

        SectorAlarmClient {
            agent: ureq::Agent::new_with_config(config),
            base_url: options.base_url.trim_end_matches('/').to_string(),
            credentials,
            version: None,
            version_source: Box::new(LandingPage),
        }
    }

    /// Replace how the version token is obtained after login.
    pub fn with_version_source(mut self, source: impl VersionSource + 'static) -> Self {
        self.version_source = Box::new(source);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token discovered by the last successful login.
    pub fn version(&self) -> Option<&VersionToken> {
        self.version.as_ref()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn login(&mut self) -> Result<(), SectorAlarmError> {
        let url = self.url(LOGIN_PATH);
        debug!("POST {} as {}", url, self.credentials.user_id);

        let resp = self.agent.post(&url).send_form([
            ("userID", self.credentials.user_id.as_str()),
            ("password", self.credentials.password.as_str()),
        ])?;

        let status = resp.status();
        if status != StatusCode::FOUND {
            return Err(SectorAlarmError::LoginRejected {
                status: status.as_u16(),
            });
        }

        let version = self.version_source.fetch_version(&self.agent, &self.base_url)?;
        info!("Logged in as {} (portal version {})", self.credentials.user_id, version.as_str());
        self.version = Some(version);
        Ok(())
    }

    fn panel_request<'a>(&'a self, panel_id: &'a PanelId) -> PanelRequest<'a> {
        PanelRequest {
            id: &panel_id.0,
            // Not validated here; before login the portal rejects the empty token.
            version: self.version.as_ref().map(VersionToken::as_str).unwrap_or_default(),
        }
    }

    fn post_panel(&self, path: &str, panel_id: &PanelId) -> Result<http::Response<ureq::Body>, SectorAlarmError> {
        let url = self.url(path);
        debug!("POST {} for panel {}", url, panel_id);
        let resp = self
            .agent
            .post(&url)
            .header("Accept", "application/json")
            .send_json(self.panel_request(panel_id))?;
        Ok(resp)
    }

    pub fn get_panel_list(&self) -> Result<Vec<Panel>, SectorAlarmError> {
        let url = self.url(PANEL_LIST_PATH);
        debug!("GET {}", url);
        let resp = self.agent.get(&url).header("Accept", "application/json").call()?;
        decode_json(PANEL_LIST_PATH, require_ok(resp)?)
    }

    pub fn get_temperatures(&self, panel_id: &PanelId) -> Result<Vec<Temperature>, SectorAlarmError> {
        let resp = self.post_panel(TEMPERATURES_PATH, panel_id)?;
        decode_json(TEMPERATURES_PATH, require_ok(resp)?)
    }

    /// Unlike the other fetchers this does not check the status first; an error page surfaces as
    /// `MalformedResponse`.
    pub fn get_overview(&self, panel_id: &PanelId) -> Result<Overview, SectorAlarmError> {
        let resp = self.post_panel(OVERVIEW_PATH, panel_id)?;
        decode_json(OVERVIEW_PATH, resp)
    }
}

/// Status line as HTTP renders it, e.g. "500 Internal Server Error".
fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

fn require_ok(resp: http::Response<ureq::Body>) -> Result<http::Response<ureq::Body>, SectorAlarmError> {
    let status = resp.status();
    if status == StatusCode::OK {
        Ok(resp)
    } else {
        Err(SectorAlarmError::Http {
            status: status.as_u16(),
            status_text: status_text(status),
        })
    }
}

fn decode_json<T: DeserializeOwned>(
    endpoint: &'static str,
    resp: http::Response<ureq::Body>,
) -> Result<T, SectorAlarmError> {
    let reader = resp.into_body().into_reader();
    let de = &mut serde_json::Deserializer::from_reader(reader);
    serde_path_to_error::deserialize(de).map_err(|e| {
        let path = e.path().to_string();
        let source = e.into_inner();
        if source.is_io() {
            SectorAlarmError::Io(source.into())
        } else {
            SectorAlarmError::MalformedResponse { endpoint, path, source }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    const SESSION_COOKIE: &str = "ASPXAUTH=s3ss10n";

    struct FixedVersion(&'static str);

    impl VersionSource for FixedVersion {
        fn fetch_version(&self, _agent: &ureq::Agent, _base_url: &str) -> Result<VersionToken, SectorAlarmError> {
            Ok(VersionToken(self.0.to_string()))
        }
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/data/{name}")).expect("fixture present")
    }

    fn client_for(server: &ServerGuard) -> SectorAlarmClient {
        let options = ClientOptions {
            base_url: server.url(),
            timeout: Some(Duration::from_secs(5)),
        };
        SectorAlarmClient::with_options(Credentials::new("user@example.com", "hunter2"), options)
    }

    fn mock_login(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", LOGIN_PATH)
            .match_header("content-type", Matcher::Regex("application/x-www-form-urlencoded".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("userID".into(), "user@example.com".into()),
                Matcher::UrlEncoded("password".into(), "hunter2".into()),
            ]))
            .with_status(302)
            .with_header("location", "/")
            .with_header("set-cookie", &format!("{}; path=/; HttpOnly", SESSION_COOKIE))
            .create()
    }

    fn mock_landing(server: &mut ServerGuard) -> mockito::Mock {
        server.mock("GET", "/").with_status(200).with_body(fixture("landing.html")).create()
    }

    fn logged_in(server: &mut ServerGuard) -> (SectorAlarmClient, [mockito::Mock; 2]) {
        let session = [mock_login(server), mock_landing(server)];
        let mut client = client_for(server);
        client.login().expect("login succeeds");
        (client, session)
    }

    #[test]
    fn login_stores_version_from_landing_page() {
        let mut server = Server::new();
        let login = mock_login(&mut server);
        let landing = mock_landing(&mut server);

        let mut client = client_for(&server);
        assert!(client.version().is_none());
        client.login().expect("login succeeds");

        assert_eq!(client.version(), Some(&VersionToken("vAB12_CD".into())));
        login.assert();
        landing.assert();
    }

    #[test]
    fn login_rejects_non_redirect_status() {
        for status in [200, 401] {
            let mut server = Server::new();
            let login = server.mock("POST", LOGIN_PATH).with_status(status).create();
            let landing = server.mock("GET", "/").expect(0).create();

            let mut client = client_for(&server);
            let err = client.login().unwrap_err();
            assert!(
                matches!(err, SectorAlarmError::LoginRejected { status: s } if s == status as u16),
                "got {err:?}"
            );
            assert!(client.version().is_none());
            login.assert();
            landing.assert();
        }
    }

    #[test]
    fn login_fails_when_version_marker_is_missing() {
        let mut server = Server::new();
        mock_login(&mut server);
        server.mock("GET", "/").with_status(200).with_body("<html></html>").create();

        let mut client = client_for(&server);
        let err = client.login().unwrap_err();
        assert!(matches!(err, SectorAlarmError::UnexpectedPageFormat), "got {err:?}");
        assert!(client.version().is_none());
    }

    #[test]
    fn landing_page_cookies_join_session() {
        let mut server = Server::new();
        mock_login(&mut server);
        server
            .mock("GET", "/")
            .with_status(200)
            .with_header("set-cookie", "lang=sv; path=/")
            .with_body(fixture("landing.html"))
            .create();
        let list = server
            .mock("GET", PANEL_LIST_PATH)
            .match_header(
                "cookie",
                Matcher::AllOf(vec![
                    Matcher::Regex(SESSION_COOKIE.into()),
                    Matcher::Regex("lang=sv".into()),
                ]),
            )
            .with_status(200)
            .with_body("[]")
            .create();

        let mut client = client_for(&server);
        client.login().expect("login succeeds");
        assert!(client.get_panel_list().expect("panel list").is_empty());
        list.assert();
    }

    #[test]
    fn client_can_move_between_threads() {
        let client = SectorAlarmClient::new("u", "p").with_version_source(FixedVersion("vTEST"));
        let handle = std::thread::spawn(move || client.version().is_none());
        assert!(handle.join().expect("thread finished"));
    }

    #[test]
    fn custom_version_source_replaces_scraping() {
        let mut server = Server::new();
        mock_login(&mut server);
        let landing = server.mock("GET", "/").expect(0).create();

        let mut client = client_for(&server).with_version_source(FixedVersion("vTEST"));
        client.login().expect("login succeeds");
        assert_eq!(client.version(), Some(&VersionToken("vTEST".into())));
        landing.assert();
    }

    #[test]
    fn panel_list_preserves_server_order() {
        let mut server = Server::new();
        let (client, _session) = logged_in(&mut server);
        let list = server
            .mock("GET", PANEL_LIST_PATH)
            .match_header("cookie", Matcher::Regex(SESSION_COOKIE.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(fixture("panel-list.json"))
            .create();

        let panels = client.get_panel_list().expect("panel list");
        let ids: Vec<_> = panels.iter().filter_map(|p| p.panel_id.clone()).collect();
        assert_eq!(ids, vec![PanelId("01234567".into()), PanelId("76543210".into())]);
        assert_eq!(panels[1].panel_display_name.as_deref(), Some("Summer house"));
        list.assert();
    }

    #[test]
    fn panel_list_reports_error_status() {
        let mut server = Server::new();
        let (client, _session) = logged_in(&mut server);
        server.mock("GET", PANEL_LIST_PATH).with_status(403).with_body("[]").create();

        let err = client.get_panel_list().unwrap_err();
        assert!(matches!(err, SectorAlarmError::Http { status: 403, .. }), "got {err:?}");
    }

    #[test]
    fn temperatures_surface_status_text_regardless_of_body() {
        let mut server = Server::new();
        let (client, _session) = logged_in(&mut server);
        server
            .mock("POST", TEMPERATURES_PATH)
            .with_status(500)
            .with_body(fixture("temperatures.json"))
            .create();

        let err = client.get_temperatures(&PanelId("01234567".into())).unwrap_err();
        match err {
            SectorAlarmError::Http { status, status_text } => {
                assert_eq!(status, 500);
                assert_eq!(status_text, "500 Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn temperatures_decode_on_success() {
        let mut server = Server::new();
        let (client, _session) = logged_in(&mut server);
        server
            .mock("POST", TEMPERATURES_PATH)
            .match_body(Matcher::Json(json!({"id": "01234567", "Version": "vAB12_CD"})))
            .with_status(200)
            .with_body(fixture("temperatures.json"))
            .create();

        let temps = client.get_temperatures(&PanelId("01234567".into())).expect("temperatures");
        assert_eq!(temps.len(), 2);
        assert_eq!(temps[0].celsius(), Some(21.5));
        assert_eq!(temps[1].label.as_deref(), Some("Garage"));
    }

    #[test]
    fn overview_decodes_temperature_reading() {
        let mut server = Server::new();
        let (client, _session) = logged_in(&mut server);
        server
            .mock("POST", OVERVIEW_PATH)
            .with_status(200)
            .with_body(
                r#"{"Panel":{},"Smartplugs":[],"Temperatures":[{"Id":1,"Label":"Kitchen","SerialNo":"S1","Temprature":"21.5","DeviceId":2}]}"#,
            )
            .create();

        let overview = client.get_overview(&PanelId("01234567".into())).expect("overview");
        let temps = overview.temperatures.expect("temperatures present");
        assert_eq!(temps[0].temperature.as_deref(), Some("21.5"));
    }

    #[test]
    fn overview_error_page_is_malformed_response() {
        let mut server = Server::new();
        let (client, _session) = logged_in(&mut server);
        server
            .mock("POST", OVERVIEW_PATH)
            .with_status(500)
            .with_body("<html><body>Server Error</body></html>")
            .create();

        let err = client.get_overview(&PanelId("01234567".into())).unwrap_err();
        assert!(
            matches!(err, SectorAlarmError::MalformedResponse { endpoint: OVERVIEW_PATH, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn malformed_response_names_failing_path() {
        let mut server = Server::new();
        let (client, _session) = logged_in(&mut server);
        server
            .mock("POST", TEMPERATURES_PATH)
            .with_status(200)
            .with_body(r#"[{"Label":"Kitchen","Temprature":21.5}]"#)
            .create();

        let err = client.get_temperatures(&PanelId("01234567".into())).unwrap_err();
        match err {
            SectorAlarmError::MalformedResponse { endpoint, path, .. } => {
                assert_eq!(endpoint, TEMPERATURES_PATH);
                assert_eq!(path, "[0].Temprature");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sequential_calls_reuse_session() {
        let mut server = Server::new();
        let login = mock_login(&mut server);
        let landing = mock_landing(&mut server);
        let overview = server
            .mock("POST", OVERVIEW_PATH)
            .match_header("cookie", Matcher::Regex(SESSION_COOKIE.into()))
            .match_body(Matcher::Json(json!({"id": "01234567", "Version": "vAB12_CD"})))
            .with_status(200)
            .with_body(fixture("overview.json"))
            .expect(2)
            .create();

        let mut client = client_for(&server);
        client.login().expect("login succeeds");
        let panel = PanelId("01234567".into());
        let first = client.get_overview(&panel).expect("first overview");
        let second = client.get_overview(&panel).expect("second overview");

        assert_eq!(first, second);
        login.assert();
        landing.assert();
        overview.assert();
    }

    #[test]
    fn fetch_before_login_sends_empty_version() {
        let mut server = Server::new();
        let temps = server
            .mock("POST", TEMPERATURES_PATH)
            .match_body(Matcher::Json(json!({"id": "01234567", "Version": ""})))
            .with_status(401)
            .create();

        let client = client_for(&server);
        let err = client.get_temperatures(&PanelId("01234567".into())).unwrap_err();
        assert!(matches!(err, SectorAlarmError::Http { status: 401, .. }), "got {err:?}");
        temps.assert();
    }

    #[test]
    fn clients_do_not_share_sessions() {
        let mut server = Server::new();
        let _first = logged_in(&mut server);
        let fresh = client_for(&server);
        let list = server
            .mock("GET", PANEL_LIST_PATH)
            .match_header("cookie", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create();

        assert!(fresh.get_panel_list().expect("panel list").is_empty());
        list.assert();
    }

    #[test]
    fn transport_failure_is_classified() {
        let options = ClientOptions {
            // Port 9 (discard) on localhost is expected to refuse connections.
            base_url: "http://127.0.0.1:9".into(),
            timeout: Some(Duration::from_secs(2)),
        };
        let mut client = SectorAlarmClient::with_options(Credentials::new("u", "p"), options);
        let err = client.login().unwrap_err();
        assert!(
            matches!(err, SectorAlarmError::Transport(_) | SectorAlarmError::Io(_)),
            "got {err:?}"
        );
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("user@example.com", "hunter2");
        let printed = format!("{creds:?}");
        assert!(printed.contains("user@example.com"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn status_text_matches_status_line() {
        assert_eq!(status_text(StatusCode::NOT_FOUND), "404 Not Found");
        assert_eq!(status_text(StatusCode::from_u16(599).expect("valid code")), "599");
    }
}

//! One scrape cycle: session check, WAN status, then every candidate.

use super::candidates::InterfaceCandidate;
use super::observations::{
    interface_placeholders, mib_observations, stats_observations, wan_observation,
};
use crate::config::ExporterConfig;
use crate::metrics::{Instruments, Observation};
use crate::normalize::{parse_mibs, parse_net_dev_stats};
use crate::protocol::{requests, WanStatus};
use crate::session::Authenticator;
use crate::transport::{Cookie, Credential, HttpTransport, TransportError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors building an [`Exporter`].
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),

    #[error("instrument setup failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Scrapes one router.
///
/// `scrape` is safe to call from several threads at once. The only shared
/// mutable state is the session token (behind the authenticator's lock) and
/// the instruments, which are atomic.
pub struct Exporter {
    transport: Arc<HttpTransport>,
    auth: Authenticator,
    candidates: Vec<InterfaceCandidate>,
    instruments: Instruments,
}

impl Exporter {
    /// Creates an exporter for the router at `base_url`.
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
        candidates: Vec<InterfaceCandidate>,
    ) -> Result<Self, ExporterError> {
        let transport = Arc::new(HttpTransport::new(base_url, timeout)?);
        let auth = Authenticator::new(Arc::clone(&transport), username, password);
        Ok(Self {
            transport,
            auth,
            candidates,
            instruments: Instruments::new()?,
        })
    }

    /// Creates an exporter from a validated configuration.
    pub fn from_config(config: &ExporterConfig) -> Result<Self, ExporterError> {
        Self::new(
            &config.base_url(),
            &config.username,
            &config.password,
            config.timeout,
            config.interface_candidates(),
        )
    }

    /// Logs in now instead of on the first scrape.
    pub fn login(&self) -> Result<(), crate::session::AuthError> {
        self.auth.login()
    }

    /// Current session token, empty without a session.
    pub fn session_token(&self) -> String {
        self.auth.session_token()
    }

    /// Cookies held for `host_url`.
    pub fn cookies_for_host(&self, host_url: &str) -> Vec<Cookie> {
        self.auth.cookies_for_host(host_url)
    }

    /// The authenticator, e.g. to clear the session.
    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    /// Candidates in scrape order.
    pub fn candidates(&self) -> &[InterfaceCandidate] {
        &self.candidates
    }

    /// The exporter's own instruments.
    pub fn instruments(&self) -> &Instruments {
        &self.instruments
    }

    /// Runs one scrape cycle.
    ///
    /// Never fails: request and decode errors become counter increments and
    /// placeholder values. Without a session only placeholders are returned
    /// and no request besides the login attempt is made.
    pub fn scrape(&self) -> Vec<Observation> {
        let mut observations = Vec::new();

        if !self.ensure_session() {
            observations.push(wan_observation(None));
            for candidate in &self.candidates {
                observations.extend(interface_placeholders(candidate.label()));
            }
            return observations;
        }
        self.instruments.up.set(1.0);

        observations.push(self.scrape_wan());
        for candidate in &self.candidates {
            self.scrape_candidate(candidate, &mut observations);
        }
        observations
    }

    /// Logs in if no token is held. Returns false if that login failed.
    pub fn ensure_session(&self) -> bool {
        if self.auth.has_session() {
            return true;
        }
        match self.auth.login() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Login failed, skipping scrape");
                self.instruments.auth_errors.inc();
                self.instruments.up.set(0.0);
                false
            }
        }
    }

    fn scrape_wan(&self) -> Observation {
        let Some(body) = self.fetch(requests::wan_status(), "getWANStatus") else {
            return wan_observation(None);
        };
        match WanStatus::parse(&body) {
            Ok(wan) => {
                let denied = wan.permission_denied_count();
                if denied > 0 {
                    tracing::warn!(count = denied, "Router denied permission for getWANStatus");
                    self.instruments.permission_errors.inc_by(denied as u64);
                }
                wan_observation(Some(&wan))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Undecodable getWANStatus reply");
                wan_observation(None)
            }
        }
    }

    fn scrape_candidate(&self, candidate: &InterfaceCandidate, out: &mut Vec<Observation>) {
        let id = candidate.device_id();
        let ifname = candidate.label();

        let mib = self
            .fetch(requests::mibs(id), "getMIBs")
            .and_then(|body| match parse_mibs(&body, id) {
                Ok(info) => info,
                Err(e) => {
                    tracing::warn!(candidate = id, error = %e, "Undecodable getMIBs reply");
                    None
                }
            });
        let Some(info) = mib else {
            tracing::debug!(candidate = id, ifname, "No MIB data, using placeholders");
            out.extend(interface_placeholders(ifname));
            return;
        };
        tracing::debug!(
            candidate = id,
            ifname,
            up = info.up_value(),
            mtu = info.mtu,
            speed = info.current_bit_rate,
            "Interface status"
        );
        out.extend(mib_observations(ifname, Some(&info)));

        let stats = self
            .fetch(requests::net_dev_stats(id), "getNetDevStats")
            .and_then(|body| match parse_net_dev_stats(&body) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(candidate = id, error = %e, "Undecodable getNetDevStats reply");
                    None
                }
            });
        out.extend(stats_observations(ifname, stats.as_ref()));
    }

    /// POSTs `body` with the current token. `None` on failure or an empty reply.
    fn fetch(&self, body: String, method: &str) -> Option<Vec<u8>> {
        let token = self.auth.session_token();
        match self.transport.post(Credential::Session(&token), body) {
            Ok(reply) => {
                tracing::debug!(method, bytes = reply.len(), "Router reply");
                tracing::trace!(method, body = %String::from_utf8_lossy(&reply), "Raw reply");
                if reply.is_empty() {
                    None
                } else {
                    Some(reply)
                }
            }
            Err(e) => {
                tracing::warn!(method, error = %e, "Router request failed");
                self.instruments.scrape_errors.inc();
                None
            }
        }
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("transport", &self.transport)
            .field("auth", &self.auth)
            .field("candidates", &self.candidates)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Family;
    use crate::scrape::default_candidates;
    use crate::transport::API_PATH;
    use httpmock::{Method::GET, Method::POST, Mock, MockServer};

    const LOGIN_OK: &str = r#"{"status":0,"data":{"contextID":"CTX"}}"#;
    const WAN_OK: &str = r#"{"status":true,"data":{"LinkType":"ethernet","LinkState":"up","MACAddress":"AA:BB","Protocol":"dhcp","ConnectionState":"Connected","IPAddress":"1.2.3.4"}}"#;

    fn exporter(server: &MockServer) -> Exporter {
        Exporter::new(
            &server.base_url(),
            "admin",
            "secret",
            Duration::from_secs(2),
            default_candidates(),
        )
        .unwrap()
    }

    fn mock_login(server: &MockServer) -> Mock<'_> {
        server.mock(|when, then| {
            when.method(POST)
                .path(API_PATH)
                .header("authorization", "X-Sah-Login");
            then.status(200).body(LOGIN_OK);
        })
    }

    fn mock_root(server: &MockServer) -> Mock<'_> {
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
    }

    fn mock_call<'a>(server: &'a MockServer, method: &str, status: u16, body: &str) -> Mock<'a> {
        let method = format!("\"method\":\"{method}\"");
        let body = body.to_string();
        server.mock(move |when, then| {
            when.method(POST)
                .path(API_PATH)
                .header("authorization", "X-Sah CTX")
                .body_contains(method.as_str());
            then.status(status).body(body.as_str());
        })
    }

    fn mock_service<'a>(server: &'a MockServer, service: &str, method: &str, body: &str) -> Mock<'a> {
        let service = format!("\"service\":\"{service}\"");
        let method = format!("\"method\":\"{method}\"");
        let body = body.to_string();
        server.mock(move |when, then| {
            when.method(POST)
                .path(API_PATH)
                .header("x-context", "CTX")
                .body_contains(service.as_str())
                .body_contains(method.as_str());
            then.status(200).body(body.as_str());
        })
    }

    fn find<'a>(obs: &'a [Observation], family: Family, ifname: &str) -> &'a Observation {
        obs.iter()
            .find(|o| o.family == family && o.ifname() == Some(ifname))
            .unwrap()
    }

    fn count(obs: &[Observation], family: Family) -> usize {
        obs.iter().filter(|o| o.family == family).count()
    }

    #[test]
    fn test_session_is_reused_across_scrapes() {
        let server = MockServer::start();
        let login = mock_login(&server);
        mock_root(&server);
        mock_call(&server, "getWANStatus", 200, WAN_OK);
        mock_call(&server, "getMIBs", 200, r#"{"status":{"base":{"ETH0":{"MTU":1500}}}}"#);
        mock_call(&server, "getNetDevStats", 200, r#"{"data":{"RxBytes":10}}"#);

        let exporter = exporter(&server);
        exporter.scrape();
        exporter.scrape();

        assert_eq!(login.hits(), 1);
        assert_eq!(exporter.session_token(), "CTX");
        assert_eq!(exporter.instruments().up.get(), 1.0);
    }

    #[test]
    fn test_cleared_session_logs_in_again() {
        let server = MockServer::start();
        let login = mock_login(&server);
        mock_root(&server);
        mock_call(&server, "getWANStatus", 200, WAN_OK);
        mock_call(&server, "getMIBs", 200, "");

        let exporter = exporter(&server);
        exporter.scrape();
        exporter.authenticator().invalidate();
        exporter.scrape();
        assert_eq!(login.hits(), 2);
    }

    #[test]
    fn test_auth_failure_emits_placeholders_only() {
        let server = MockServer::start();
        let login = server.mock(|when, then| {
            when.method(POST).path(API_PATH);
            then.status(200).body(r#"{"data":{"contextID":""}}"#);
        });

        let exporter = exporter(&server);
        let obs = exporter.scrape();

        assert_eq!(login.hits(), 1);
        assert_eq!(exporter.instruments().auth_errors.get(), 1);
        assert_eq!(exporter.instruments().up.get(), 0.0);
        assert_eq!(exporter.session_token(), "");

        let wan = obs
            .iter()
            .find(|o| o.family == Family::InternetConnection)
            .unwrap();
        assert_eq!(wan.labels, vec!["", "", "Unknown", "", ""]);
        assert_eq!(wan.value, 0.0);
        for family in Family::ALL.iter().filter(|f| f.is_per_interface()) {
            assert_eq!(count(&obs, *family), 4, "{}", family.name());
        }
        assert!(obs
            .iter()
            .filter(|o| !matches!(o.family, Family::NetdevInfo | Family::PortInfo))
            .all(|o| o.value == 0.0));
    }

    #[test]
    fn test_wan_up_and_candidate_values() {
        let server = MockServer::start();
        mock_login(&server);
        mock_root(&server);
        mock_call(&server, "getWANStatus", 200, WAN_OK);
        mock_service(
            &server,
            "NeMo.Intf.ETH0",
            "getMIBs",
            r#"{"status":{"Status":true,"base":{"ETH0":{"NetDevState":"down","MTU":1400}},"alias":{"ETH0":{"Alias":"wan0"}}}}"#,
        );
        mock_service(
            &server,
            "NeMo.Intf.ETH0",
            "getNetDevStats",
            r#"{"status":true,"data":{"RxPackets":1,"TxPackets":2,"RxBytes":300,"TxBytes":400}}"#,
        );
        for id in ["ETH1", "ETH2", "ETH3"] {
            mock_service(&server, &format!("NeMo.Intf.{id}"), "getMIBs", "");
        }

        let exporter = exporter(&server);
        let obs = exporter.scrape();

        let wan = obs
            .iter()
            .find(|o| o.family == Family::InternetConnection)
            .unwrap();
        assert_eq!(wan.value, 1.0);
        assert_eq!(wan.labels, vec!["ethernet", "dhcp", "Connected", "1.2.3.4", "AA:BB"]);

        assert_eq!(find(&obs, Family::NetdevUp, "eth1").value, 1.0);
        assert_eq!(find(&obs, Family::NetdevMtu, "eth1").value, 1400.0);
        assert_eq!(find(&obs, Family::NetdevInfo, "eth1").labels[1], "wan0");
        assert_eq!(find(&obs, Family::RxBytes, "eth1").value, 300.0);
        assert_eq!(find(&obs, Family::TxBytes, "eth1").value, 400.0);
        assert_eq!(find(&obs, Family::Collisions, "eth1").value, 0.0);

        for ifname in ["eth2", "eth3", "eth4"] {
            assert_eq!(find(&obs, Family::NetdevUp, ifname).value, 0.0);
            assert_eq!(find(&obs, Family::NetdevMtu, ifname).value, 0.0);
            assert_eq!(find(&obs, Family::RxBytes, ifname).value, 0.0);
        }
        for family in Family::ALL.iter().filter(|f| f.is_per_interface()) {
            assert_eq!(count(&obs, *family), 4, "{}", family.name());
        }
        assert_eq!(exporter.instruments().scrape_errors.get(), 0);
    }

    #[test]
    fn test_empty_mibs_for_one_candidate() {
        let server = MockServer::start();
        mock_login(&server);
        mock_root(&server);
        mock_call(&server, "getWANStatus", 200, WAN_OK);
        let good = r#"{"status":{"base":{"ETH0":{"NetDevState":"up","MTU":1500}}}}"#;
        mock_service(&server, "NeMo.Intf.ETH0", "getMIBs", good);
        mock_service(&server, "NeMo.Intf.ETH1", "getMIBs", "");
        mock_service(&server, "NeMo.Intf.ETH2", "getMIBs", good);
        mock_service(&server, "NeMo.Intf.ETH3", "getMIBs", good);
        let stats = mock_call(&server, "getNetDevStats", 200, r#"{"data":{"RxPackets":5}}"#);

        let exporter = exporter(&server);
        let obs = exporter.scrape();

        assert_eq!(find(&obs, Family::NetdevUp, "eth2").value, 0.0);
        assert_eq!(find(&obs, Family::NetdevMtu, "eth2").value, 0.0);
        assert_eq!(find(&obs, Family::RxPackets, "eth2").value, 0.0);
        for ifname in ["eth1", "eth3", "eth4"] {
            assert_eq!(find(&obs, Family::NetdevUp, ifname).value, 1.0);
            assert_eq!(find(&obs, Family::NetdevMtu, ifname).value, 1500.0);
            assert_eq!(find(&obs, Family::RxPackets, ifname).value, 5.0);
        }
        assert_eq!(stats.hits(), 3);
    }

    #[test]
    fn test_http_errors_count_and_substitute() {
        let server = MockServer::start();
        mock_login(&server);
        mock_root(&server);
        mock_call(&server, "getWANStatus", 500, "boom");
        mock_call(&server, "getMIBs", 404, "");

        let exporter = exporter(&server);
        let obs = exporter.scrape();

        let wan = obs
            .iter()
            .find(|o| o.family == Family::InternetConnection)
            .unwrap();
        assert_eq!(wan.labels[2], "Unknown");
        assert_eq!(wan.value, 0.0);
        // one WAN failure plus one MIBs failure per candidate
        assert_eq!(exporter.instruments().scrape_errors.get(), 5);
        assert_eq!(count(&obs, Family::RxPackets), 4);
        assert_eq!(exporter.instruments().up.get(), 1.0);
    }

    #[test]
    fn test_permission_denied_is_counted() {
        let server = MockServer::start();
        mock_login(&server);
        mock_root(&server);
        mock_call(
            &server,
            "getWANStatus",
            200,
            r#"{"status":false,"errors":[{"error":1,"description":"Permission denied","info":""}]}"#,
        );
        mock_call(&server, "getMIBs", 200, "");

        let exporter = exporter(&server);
        let obs = exporter.scrape();

        assert_eq!(exporter.instruments().permission_errors.get(), 1);
        assert_eq!(exporter.instruments().scrape_errors.get(), 0);
        let wan = obs
            .iter()
            .find(|o| o.family == Family::InternetConnection)
            .unwrap();
        assert_eq!(wan.value, 0.0);
        assert_eq!(wan.labels[2], "Unknown");
    }

    #[test]
    fn test_malformed_replies_use_placeholders() {
        let server = MockServer::start();
        mock_login(&server);
        mock_root(&server);
        mock_call(&server, "getWANStatus", 200, "not-json");
        mock_call(&server, "getMIBs", 200, "{broken");

        let exporter = exporter(&server);
        let obs = exporter.scrape();

        assert_eq!(count(&obs, Family::InternetConnection), 1);
        assert_eq!(count(&obs, Family::NetdevUp), 4);
        assert_eq!(count(&obs, Family::TxWindowErrors), 4);
        assert_eq!(exporter.instruments().scrape_errors.get(), 0);
    }

    #[test]
    fn test_candidate_order_sets_labels() {
        let server = MockServer::start();
        mock_login(&server);
        mock_root(&server);
        mock_call(&server, "getWANStatus", 200, WAN_OK);
        mock_service(
            &server,
            "NeMo.Intf.ETH3",
            "getMIBs",
            r#"{"status":{"base":{"ETH3":{"MTU":9000}}}}"#,
        );
        mock_service(&server, "NeMo.Intf.ETH0", "getMIBs", "");
        mock_call(&server, "getNetDevStats", 200, "{}");

        let exporter = Exporter::new(
            &server.base_url(),
            "admin",
            "secret",
            Duration::from_secs(2),
            crate::scrape::parse_candidate_list("eth3,eth0"),
        )
        .unwrap();
        let obs = exporter.scrape();

        assert_eq!(find(&obs, Family::NetdevMtu, "eth1").value, 9000.0);
        assert_eq!(find(&obs, Family::NetdevMtu, "eth2").value, 0.0);
        assert_eq!(count(&obs, Family::NetdevMtu), 2);
    }

    #[test]
    fn test_concurrent_scrapes_share_one_session() {
        let server = MockServer::start();
        let login = mock_login(&server);
        mock_root(&server);
        mock_call(&server, "getWANStatus", 200, WAN_OK);
        mock_call(&server, "getMIBs", 200, r#"{"status":{"base":{"ETH0":{"MTU":1500}}}}"#);
        mock_call(&server, "getNetDevStats", 200, r#"{"data":{"RxBytes":10}}"#);

        let exporter = exporter(&server);
        exporter.login().unwrap();

        let results: Vec<Vec<Observation>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| exporter.scrape())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.len(), 8);
        for obs in &results {
            let mtus: Vec<f64> = obs
                .iter()
                .filter(|o| o.family == Family::NetdevMtu)
                .map(|o| o.value)
                .collect();
            assert_eq!(mtus, vec![1500.0; 4]);
            let wan = obs
                .iter()
                .find(|o| o.family == Family::InternetConnection)
                .unwrap();
            assert_eq!(wan.value, 1.0);
        }
        assert_eq!(login.hits(), 1);
        assert_eq!(exporter.instruments().auth_errors.get(), 0);
        assert_eq!(exporter.instruments().scrape_errors.get(), 0);
    }

    /// Minimal router that answers every call and logs `<method> <service>`
    /// in arrival order.
    fn recording_router() -> (String, Arc<parking_lot::Mutex<Vec<String>>>) {
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let shared = Arc::clone(&log);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let log = Arc::clone(&shared);
                std::thread::spawn(move || answer_requests(stream, &log));
            }
        });
        (format!("http://{addr}"), log)
    }

    fn answer_requests(stream: std::net::TcpStream, log: &parking_lot::Mutex<Vec<String>>) {
        use std::io::{BufRead, BufReader, Read, Write};

        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        loop {
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
                return;
            }
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    return;
                }
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut body = vec![0; content_length];
            if reader.read_exact(&mut body).is_err() {
                return;
            }

            let reply = if request_line.starts_with("GET") {
                log.lock().push("GET /".to_string());
                String::new()
            } else {
                let call: serde_json::Value = serde_json::from_slice(&body).unwrap();
                let method = call["method"].as_str().unwrap_or_default();
                let service = call["service"].as_str().unwrap_or_default();
                log.lock().push(format!("{method} {service}"));
                match method {
                    "createContext" => LOGIN_OK.to_string(),
                    "getWANStatus" => WAN_OK.to_string(),
                    "getMIBs" => r#"{"status":{"base":{"ANY":{"MTU":1500}}}}"#.to_string(),
                    _ => r#"{"data":{"RxBytes":1}}"#.to_string(),
                }
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
                reply.len(),
                reply
            );
            if writer.write_all(response.as_bytes()).is_err() {
                return;
            }
        }
    }

    #[test]
    fn test_requests_follow_cycle_order() {
        let (base_url, log) = recording_router();
        let exporter = Exporter::new(
            &base_url,
            "admin",
            "secret",
            Duration::from_secs(2),
            crate::scrape::parse_candidate_list("eth3,eth0"),
        )
        .unwrap();

        let obs = exporter.scrape();

        assert_eq!(
            *log.lock(),
            vec![
                "createContext sah.Device.Information",
                "GET /",
                "getWANStatus NMC",
                "getMIBs NeMo.Intf.ETH3",
                "getNetDevStats NeMo.Intf.ETH3",
                "getMIBs NeMo.Intf.ETH0",
                "getNetDevStats NeMo.Intf.ETH0",
            ]
        );
        assert_eq!(find(&obs, Family::NetdevMtu, "eth1").value, 1500.0);
        assert_eq!(find(&obs, Family::RxBytes, "eth2").value, 1.0);
    }
}

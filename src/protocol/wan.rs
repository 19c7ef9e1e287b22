//! Typed view of the `getWANStatus` reply.

use crate::normalize::{as_bool, as_float, member};
use serde::de::Error as _;
use serde_json::{Map, Value};

/// Label used when the device does not report a connection state.
pub const UNKNOWN_STATE: &str = "Unknown";

/// Decoded `getWANStatus` reply.
///
/// Member names match case-insensitively, preferring an exact match when
/// both spellings are present. Missing or `null` members take their
/// defaults; only a body that is not a JSON object is an error.
#[derive(Debug, Clone, Default)]
pub struct WanStatus {
    /// Whether the call itself succeeded.
    pub status: bool,
    /// Connection details.
    pub data: WanData,
    /// Errors reported by the API.
    pub errors: Vec<ApiError>,
}

/// Connection details inside `data`.
#[derive(Debug, Clone, Default)]
pub struct WanData {
    /// Physical link type, e.g. `ethernet`.
    pub link_type: String,
    /// Link state, e.g. `up`.
    pub link_state: String,
    /// WAN MAC address.
    pub mac_address: String,
    /// Connection protocol, e.g. `dhcp`.
    pub protocol: String,
    /// `Connected` when online.
    pub connection_state: String,
    /// WAN IP address.
    pub ip_address: String,
}

/// One entry of the `errors` list the API attaches to failed calls.
#[derive(Debug, Clone, Default)]
pub struct ApiError {
    /// Numeric error code.
    pub error: i64,
    /// Human-readable description.
    pub description: String,
    /// Extra detail, often empty.
    pub info: String,
}

impl WanData {
    fn from_object(data: &Map<String, Value>) -> Self {
        Self {
            link_type: string_member(data, "LinkType"),
            link_state: string_member(data, "LinkState"),
            mac_address: string_member(data, "MACAddress"),
            protocol: string_member(data, "Protocol"),
            connection_state: string_member(data, "ConnectionState"),
            ip_address: string_member(data, "IPAddress"),
        }
    }
}

impl ApiError {
    fn from_object(entry: &Map<String, Value>) -> Self {
        Self {
            error: member(entry, "error").and_then(as_float).unwrap_or(0.0) as i64,
            description: string_member(entry, "description"),
            info: string_member(entry, "info"),
        }
    }

    /// True for the API's "Permission denied" error.
    pub fn is_permission_denied(&self) -> bool {
        self.description
            .to_ascii_lowercase()
            .contains("permission denied")
    }
}

impl WanStatus {
    /// Decodes a raw reply body.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let document: Value = serde_json::from_slice(body)?;
        let root = document
            .as_object()
            .ok_or_else(|| serde_json::Error::custom("getWANStatus reply is not a JSON object"))?;

        let data = member(root, "data")
            .and_then(Value::as_object)
            .map(WanData::from_object)
            .unwrap_or_default();
        let errors = member(root, "errors")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_object)
                    .map(ApiError::from_object)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            status: member(root, "status").and_then(as_bool).unwrap_or(false),
            data,
            errors,
        })
    }

    /// The WAN is up only when the call succeeded and the link reports `Connected`.
    pub fn is_up(&self) -> bool {
        self.status && self.data.connection_state == "Connected"
    }

    /// Gauge value for [`is_up`](Self::is_up).
    pub fn up_value(&self) -> f64 {
        if self.is_up() {
            1.0
        } else {
            0.0
        }
    }

    /// Connection state for labelling; empty becomes `Unknown`.
    pub fn connection_state_label(&self) -> &str {
        if self.data.connection_state.is_empty() {
            UNKNOWN_STATE
        } else {
            &self.data.connection_state
        }
    }

    /// Number of permission-denied entries in the error list.
    pub fn permission_denied_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_permission_denied()).count()
    }
}

fn string_member(map: &Map<String, Value>, key: &str) -> String {
    member(map, key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_status_is_up() {
        let body = br#"{"status":true,"data":{"LinkType":"ethernet","LinkState":"up","MACAddress":"AA:BB","Protocol":"dhcp","ConnectionState":"Connected","IPAddress":"1.2.3.4"}}"#;
        let wan = WanStatus::parse(body).unwrap();
        assert!(wan.is_up());
        assert_eq!(wan.up_value(), 1.0);
        assert_eq!(wan.data.ip_address, "1.2.3.4");
        assert_eq!(wan.connection_state_label(), "Connected");
    }

    #[test]
    fn test_up_requires_both_flags() {
        let cases: [(&[u8], f64); 4] = [
            (br#"{"status":false,"data":{"ConnectionState":"Connected"}}"#, 0.0),
            (br#"{"status":true,"data":{"ConnectionState":"Disconnected"}}"#, 0.0),
            (br#"{"status":true,"data":{}}"#, 0.0),
            (br#"{"status":true,"data":{"connectionState":"Connected"}}"#, 1.0),
        ];
        for (body, expected) in cases {
            let wan = WanStatus::parse(body).unwrap();
            assert_eq!(wan.up_value(), expected, "body: {}", String::from_utf8_lossy(body));
        }
    }

    #[test]
    fn test_empty_state_is_unknown() {
        let wan = WanStatus::parse(br#"{"status":true,"data":null}"#).unwrap();
        assert_eq!(wan.connection_state_label(), UNKNOWN_STATE);
    }

    #[test]
    fn test_permission_denied_detection() {
        let body = br#"{"status":false,"errors":[{"error":13,"description":"Permission denied","info":""},{"error":1,"description":"Other"}]}"#;
        let wan = WanStatus::parse(body).unwrap();
        assert_eq!(wan.permission_denied_count(), 1);
        assert!(!wan.is_up());
    }

    #[test]
    fn test_malformed_body_is_error() {
        assert!(WanStatus::parse(b"not-json").is_err());
        assert!(WanStatus::parse(b"").is_err());
    }

    #[test]
    fn test_both_key_spellings_decode() {
        let body = br#"{"status":true,"Status":false,"data":{"ConnectionState":"Connected","connectionstate":"Down"}}"#;
        let wan = WanStatus::parse(body).unwrap();
        assert!(wan.status);
        assert_eq!(wan.data.connection_state, "Connected");
        assert!(wan.is_up());
    }

    #[test]
    fn test_keys_match_any_case() {
        let body = br#"{"STATUS":true,"Data":{"connectionstate":"Connected","ipaddress":"10.0.0.2"},"Errors":[]}"#;
        let wan = WanStatus::parse(body).unwrap();
        assert!(wan.is_up());
        assert_eq!(wan.data.ip_address, "10.0.0.2");
    }

    #[test]
    fn test_non_object_reply_is_error() {
        assert!(WanStatus::parse(b"[1,2]").is_err());
        assert!(WanStatus::parse(br#""text""#).is_err());
    }
}

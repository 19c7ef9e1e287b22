//! Typed views over `getMIBs` and `getNetDevStats` replies.

use super::locate::{
    candidate_entry, extract_candidate_record, locate_status_section, member,
    parse_net_dev_stats_record, section_alias, section_status, BASE_KEY,
};
use super::record::NormalizedRecord;
use serde_json::Value;

/// Port parameters of one interface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortParams {
    /// Lower-layer interface. Object-valued `LLIntf` is rendered as its keys joined by `,`.
    pub ll_intf: String,
    /// `CurrentBitRate` in Mbps.
    pub current_bit_rate: f64,
    /// `MaxBitRateSupported` in Mbps.
    pub max_bit_rate_supported: f64,
    /// `MaxBitRateEnabled` in Mbps.
    pub max_bit_rate_enabled: f64,
    /// `CurrentDuplexMode`, e.g. `Full`.
    pub current_duplex_mode: String,
    /// `DuplexModeEnabled`.
    pub duplex_mode_enabled: bool,
    /// Physical port the interface maps to: the first key of
    /// `base.<candidate>.LLIntf`, or that value itself when it is a string.
    pub set_port: String,
}

/// Values read from a `getMIBs` reply for one candidate.
///
/// Fields the device did not report hold their zero value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MibInfo {
    /// Device-side identifier the reply was read for.
    pub candidate: String,
    /// `alias.<candidate>.Alias`, else the record's `Alias`.
    pub alias: String,
    /// `NetDevFlags`, else `Flags`.
    pub flags: String,
    /// `LLAddress` (MAC).
    pub ll_address: String,
    /// `NetDevType`.
    pub netdev_type: String,
    /// `MTU`.
    pub mtu: f64,
    /// `TxQueueLen`.
    pub tx_queue_len: f64,
    /// `NetDevState`, e.g. `up`.
    pub netdev_state: String,
    /// Speed in Mbps (`CurrentBitRate`, else `CurrentBitRateMbps`).
    pub current_bit_rate: f64,
    /// `LastChangeTime` in seconds.
    pub last_change_time: f64,
    /// `Status` of the candidate record.
    pub status: Option<bool>,
    /// `Status` of the enclosing section.
    pub section_status: Option<bool>,
    /// Port parameters from the same record.
    pub port: PortParams,
}

impl MibInfo {
    /// Builds the view from a located section and the candidate's record.
    pub fn from_record(
        candidate: &str,
        record: &NormalizedRecord,
        section: &serde_json::Map<String, Value>,
    ) -> Self {
        let alias = section_alias(section, candidate)
            .or_else(|| record.get_string("Alias"))
            .unwrap_or_default();

        let set_port = candidate_entry(section, BASE_KEY, candidate)
            .and_then(|entry| member(entry, "LLIntf"))
            .and_then(first_key_or_string)
            .unwrap_or_default();

        let port = PortParams {
            ll_intf: record.get("LLIntf").map(render_ll_intf).unwrap_or_default(),
            current_bit_rate: record.get_float("CurrentBitRate").unwrap_or(0.0),
            max_bit_rate_supported: record.get_float("MaxBitRateSupported").unwrap_or(0.0),
            max_bit_rate_enabled: record.get_float("MaxBitRateEnabled").unwrap_or(0.0),
            current_duplex_mode: string_or_empty(record, &["CurrentDuplexMode"]),
            duplex_mode_enabled: record.get_bool("DuplexModeEnabled").unwrap_or(false),
            set_port,
        };

        Self {
            candidate: candidate.to_string(),
            alias: alias.to_string(),
            flags: string_or_empty(record, &["NetDevFlags", "Flags"]),
            ll_address: string_or_empty(record, &["LLAddress"]),
            netdev_type: string_or_empty(record, &["NetDevType"]),
            mtu: record.get_float("MTU").unwrap_or(0.0),
            tx_queue_len: record.get_float("TxQueueLen").unwrap_or(0.0),
            netdev_state: string_or_empty(record, &["NetDevState"]),
            current_bit_rate: record
                .first_float(&["CurrentBitRate", "CurrentBitRateMbps"])
                .unwrap_or(0.0),
            last_change_time: record.get_float("LastChangeTime").unwrap_or(0.0),
            status: record.get_bool("Status"),
            section_status: section_status(section),
            port,
        }
    }

    /// Whether the interface counts as up.
    ///
    /// A true `Status` on the record or on its section wins over
    /// `NetDevState`; otherwise `NetDevState` must be `up`.
    pub fn is_up(&self) -> bool {
        self.status == Some(true)
            || self.section_status == Some(true)
            || self.netdev_state.eq_ignore_ascii_case("up")
    }

    /// Gauge value for [`is_up`](Self::is_up).
    pub fn up_value(&self) -> f64 {
        if self.is_up() {
            1.0
        } else {
            0.0
        }
    }
}

/// Decodes a `getMIBs` reply for `candidate`.
///
/// `Ok(None)` means the body was empty or carried no data for the
/// candidate. Only undecodable JSON is an error.
pub fn parse_mibs(body: &[u8], candidate: &str) -> Result<Option<MibInfo>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let document: Value = serde_json::from_slice(body)?;
    let Some(section) = locate_status_section(&document) else {
        return Ok(None);
    };
    Ok(extract_candidate_record(section, candidate)
        .map(|record| MibInfo::from_record(candidate, &record, section)))
}

/// Decodes a `getNetDevStats` reply into its flat counter record.
pub fn parse_net_dev_stats(body: &[u8]) -> Result<Option<NormalizedRecord>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let document: Value = serde_json::from_slice(body)?;
    Ok(parse_net_dev_stats_record(&document))
}

fn string_or_empty(record: &NormalizedRecord, keys: &[&str]) -> String {
    record.first_string(keys).unwrap_or_default().to_string()
}

fn first_key_or_string(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.keys().next().cloned(),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn render_ll_intf(value: &Value) -> String {
    match value {
        Value::Object(map) => map.keys().map(String::as_str).collect::<Vec<_>>().join(","),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

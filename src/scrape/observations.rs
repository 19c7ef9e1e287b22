//! Turning decoded replies into observations.
//!
//! Each builder covers a whole group of families and takes its data as an
//! `Option`: `None` yields the zero/`Unknown` placeholders, so a group is
//! complete whether or not the fetch succeeded.

use crate::metrics::{Family, Observation, Source};
use crate::normalize::{MibInfo, NormalizedRecord};
use crate::protocol::{WanStatus, UNKNOWN_STATE};

/// The `internet_connection` observation.
pub fn wan_observation(status: Option<&WanStatus>) -> Observation {
    match status {
        Some(wan) => Observation::new(
            Family::InternetConnection,
            [
                wan.data.link_type.as_str(),
                wan.data.protocol.as_str(),
                wan.connection_state_label(),
                wan.data.ip_address.as_str(),
                wan.data.mac_address.as_str(),
            ],
            wan.up_value(),
        ),
        None => Observation::new(
            Family::InternetConnection,
            ["", "", UNKNOWN_STATE, "", ""],
            0.0,
        ),
    }
}

/// One observation per `getMIBs` family for the interface `ifname`.
pub fn mib_observations(ifname: &str, info: Option<&MibInfo>) -> Vec<Observation> {
    Family::mib_families()
        .map(|family| mib_observation(family, ifname, info))
        .collect()
}

fn mib_observation(family: Family, ifname: &str, info: Option<&MibInfo>) -> Observation {
    let default = MibInfo::default();
    let mib = info.unwrap_or(&default);

    match family {
        Family::NetdevInfo => Observation::new(
            family,
            [
                ifname,
                mib.alias.as_str(),
                mib.flags.as_str(),
                mib.ll_address.as_str(),
                mib.netdev_type.as_str(),
            ],
            1.0,
        ),
        Family::PortInfo => Observation::new(
            family,
            [
                ifname,
                mib.port.set_port.as_str(),
                mib.port.current_duplex_mode.as_str(),
                mib.port.ll_intf.as_str(),
            ],
            1.0,
        ),
        _ => {
            let value = match family {
                Family::NetdevUp => mib.up_value(),
                Family::NetdevMtu => mib.mtu,
                Family::NetdevTxQueueLen => mib.tx_queue_len,
                Family::NetdevSpeedMbps => mib.current_bit_rate,
                Family::NetdevLastChange => mib.last_change_time,
                Family::PortMaxBitRateSupported => mib.port.max_bit_rate_supported,
                Family::PortMaxBitRateEnabled => mib.port.max_bit_rate_enabled,
                Family::PortDuplexEnabled => bool_value(mib.port.duplex_mode_enabled),
                _ => 0.0,
            };
            Observation::new(family, [ifname], value)
        }
    }
}

/// One observation per `getNetDevStats` counter family for `ifname`.
///
/// Counters missing from the record are reported as 0.
pub fn stats_observations(ifname: &str, stats: Option<&NormalizedRecord>) -> Vec<Observation> {
    Family::stat_families()
        .map(|family| {
            let value = match (family.source(), stats) {
                (Source::Stats(field), Some(record)) => record.get_float(field).unwrap_or(0.0),
                _ => 0.0,
            };
            Observation::new(family, [ifname], value)
        })
        .collect()
}

/// All per-interface placeholders for `ifname`.
pub fn interface_placeholders(ifname: &str) -> Vec<Observation> {
    let mut observations = mib_observations(ifname, None);
    observations.extend(stats_observations(ifname, None));
    observations
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

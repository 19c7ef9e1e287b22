//! Statically declared metric families.
//!
//! Every family has a fixed name and label set. The scrape emits
//! [`Observation`]s against these families; the collector turns them into
//! Prometheus gauges.

/// Prefix shared by every exported metric.
pub const METRIC_PREFIX: &str = "experia_v10_";

/// Where a family's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The `getWANStatus` reply.
    Wan,
    /// The per-interface `getMIBs` reply.
    Mibs,
    /// A counter field of the per-interface `getNetDevStats` reply.
    Stats(&'static str),
}

macro_rules! families {
    ($($variant:ident => $name:literal, $help:literal, [$($label:literal),*], $source:expr;)*) => {
        /// A data-bearing metric family.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Family {
            $(
                #[doc = $help]
                $variant,
            )*
        }

        impl Family {
            /// Every family, in exposition order.
            pub const ALL: &'static [Family] = &[$(Family::$variant),*];

            /// Fully qualified metric name.
            pub fn name(self) -> &'static str {
                match self {
                    $(Family::$variant => concat!("experia_v10_", $name),)*
                }
            }

            /// Help text.
            pub fn help(self) -> &'static str {
                match self {
                    $(Family::$variant => $help,)*
                }
            }

            /// Label names, in the order observations supply values.
            pub fn label_names(self) -> &'static [&'static str] {
                match self {
                    $(Family::$variant => &[$($label),*],)*
                }
            }

            /// Reply the value is read from.
            pub fn source(self) -> Source {
                match self {
                    $(Family::$variant => $source,)*
                }
            }
        }
    };
}

families! {
    InternetConnection => "internet_connection", "The internet connection status",
        ["link_type", "protocol", "connection_state", "ip", "mac"], Source::Wan;

    NetdevUp => "netdev_up", "1 if the network device is up", ["ifname"], Source::Mibs;
    NetdevMtu => "netdev_mtu", "MTU of the network device", ["ifname"], Source::Mibs;
    NetdevTxQueueLen => "netdev_tx_queue_len", "Tx queue length of the network device",
        ["ifname"], Source::Mibs;
    NetdevSpeedMbps => "netdev_speed_mbps", "Current bit rate of the device in Mbps",
        ["ifname"], Source::Mibs;
    NetdevLastChange => "netdev_last_change_seconds",
        "LastChange time reported by the device (seconds)", ["ifname"], Source::Mibs;
    NetdevInfo => "netdev_info",
        "Static info about the netdev (value is always 1), labels: alias, flags, lladdr, type",
        ["ifname", "alias", "flags", "lladdr", "type"], Source::Mibs;
    PortMaxBitRateSupported => "netdev_port_max_bitrate_supported_mbps",
        "Maximum bit rate supported by the port in Mbps", ["ifname"], Source::Mibs;
    PortMaxBitRateEnabled => "netdev_port_max_bitrate_enabled_mbps",
        "Maximum bit rate enabled on the port in Mbps", ["ifname"], Source::Mibs;
    PortDuplexEnabled => "netdev_port_duplex_enabled", "1 if duplex mode is enabled on the port",
        ["ifname"], Source::Mibs;
    PortInfo => "netdev_port_info",
        "Port mapping of the netdev (value is always 1), labels: set_port, duplex_mode, llintf",
        ["ifname", "set_port", "duplex_mode", "llintf"], Source::Mibs;

    RxPackets => "netdev_rx_packets_total", "Number of received packets",
        ["ifname"], Source::Stats("RxPackets");
    TxPackets => "netdev_tx_packets_total", "Number of transmitted packets",
        ["ifname"], Source::Stats("TxPackets");
    RxBytes => "netdev_rx_bytes_total", "Number of received bytes",
        ["ifname"], Source::Stats("RxBytes");
    TxBytes => "netdev_tx_bytes_total", "Number of transmitted bytes",
        ["ifname"], Source::Stats("TxBytes");
    RxErrors => "netdev_rx_errors_total", "Number of receive errors",
        ["ifname"], Source::Stats("RxErrors");
    TxErrors => "netdev_tx_errors_total", "Number of transmit errors",
        ["ifname"], Source::Stats("TxErrors");
    RxDropped => "netdev_rx_dropped_total", "Number of received dropped packets",
        ["ifname"], Source::Stats("RxDropped");
    TxDropped => "netdev_tx_dropped_total", "Number of transmitted dropped packets",
        ["ifname"], Source::Stats("TxDropped");
    Multicast => "netdev_multicast_total", "Number of multicast packets",
        ["ifname"], Source::Stats("Multicast");
    Collisions => "netdev_collisions_total", "Number of collisions",
        ["ifname"], Source::Stats("Collisions");
    RxLengthErrors => "netdev_rx_length_errors_total", "Rx length errors",
        ["ifname"], Source::Stats("RxLengthErrors");
    RxOverErrors => "netdev_rx_over_errors_total", "Rx over errors",
        ["ifname"], Source::Stats("RxOverErrors");
    RxCrcErrors => "netdev_rx_crc_errors_total", "Rx CRC errors",
        ["ifname"], Source::Stats("RxCrcErrors");
    RxFrameErrors => "netdev_rx_frame_errors_total", "Rx frame errors",
        ["ifname"], Source::Stats("RxFrameErrors");
    RxFifoErrors => "netdev_rx_fifo_errors_total", "Rx FIFO errors",
        ["ifname"], Source::Stats("RxFifoErrors");
    RxMissedErrors => "netdev_rx_missed_errors_total", "Rx missed errors",
        ["ifname"], Source::Stats("RxMissedErrors");
    TxAbortedErrors => "netdev_tx_aborted_errors_total", "Tx aborted errors",
        ["ifname"], Source::Stats("TxAbortedErrors");
    TxCarrierErrors => "netdev_tx_carrier_errors_total", "Tx carrier errors",
        ["ifname"], Source::Stats("TxCarrierErrors");
    TxFifoErrors => "netdev_tx_fifo_errors_total", "Tx FIFO errors",
        ["ifname"], Source::Stats("TxFifoErrors");
    TxHeartbeatErrors => "netdev_tx_heartbeat_errors_total", "Tx heartbeat errors",
        ["ifname"], Source::Stats("TxHeartbeatErrors");
    TxWindowErrors => "netdev_tx_window_errors_total", "Tx window errors",
        ["ifname"], Source::Stats("TxWindowErrors");
}

impl Family {
    /// Families filled from `getMIBs`, one observation per candidate.
    pub fn mib_families() -> impl Iterator<Item = Family> {
        Self::ALL
            .iter()
            .copied()
            .filter(|f| f.source() == Source::Mibs)
    }

    /// Families filled from `getNetDevStats`, one observation per candidate.
    pub fn stat_families() -> impl Iterator<Item = Family> {
        Self::ALL
            .iter()
            .copied()
            .filter(|f| matches!(f.source(), Source::Stats(_)))
    }

    /// Returns true for families labelled by interface.
    pub fn is_per_interface(self) -> bool {
        self.source() != Source::Wan
    }
}

/// One sample for a family: label values in [`Family::label_names`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Family the sample belongs to.
    pub family: Family,
    /// Label values.
    pub labels: Vec<String>,
    /// Sample value.
    pub value: f64,
}

impl Observation {
    /// Creates an observation.
    pub fn new<I, S>(family: Family, labels: I, value: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        debug_assert_eq!(
            labels.len(),
            family.label_names().len(),
            "label count mismatch for {}",
            family.name()
        );
        Self {
            family,
            labels,
            value,
        }
    }

    /// The `ifname` label, for per-interface families.
    pub fn ifname(&self) -> Option<&str> {
        if self.family.is_per_interface() {
            self.labels.first().map(String::as_str)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_prefixed_and_unique() {
        let mut seen = HashSet::new();
        for family in Family::ALL {
            assert!(family.name().starts_with(METRIC_PREFIX));
            assert!(seen.insert(family.name()), "duplicate {}", family.name());
        }
    }

    #[test]
    fn test_family_groups() {
        assert_eq!(Family::stat_families().count(), 21);
        assert_eq!(Family::mib_families().count(), 10);
        assert_eq!(Family::ALL.len(), 32);
        assert!(!Family::InternetConnection.is_per_interface());
        assert!(Family::ALL
            .iter()
            .filter(|f| f.is_per_interface())
            .all(|f| f.label_names()[0] == "ifname"));
    }

    #[test]
    fn test_stats_counters_end_in_total() {
        for family in Family::stat_families() {
            assert!(family.name().ends_with("_total"));
        }
        assert_eq!(Family::RxCrcErrors.source(), Source::Stats("RxCrcErrors"));
    }

    #[test]
    fn test_observation_ifname() {
        let obs = Observation::new(Family::NetdevMtu, ["eth2"], 1500.0);
        assert_eq!(obs.ifname(), Some("eth2"));
        let wan = Observation::new(Family::InternetConnection, ["", "", "Unknown", "", ""], 0.0);
        assert_eq!(wan.ifname(), None);
    }
}

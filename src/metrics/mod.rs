//! Prometheus exposition of scrape results.
//!
//! Each exporter is registered as a [`prometheus::core::Collector`]; every
//! gather runs one scrape cycle against the router.
//!
//! # Metrics Exposed
//!
//! ## Exporter Health
//! - `experia_v10_up` - 1 when the last cycle had a session
//! - `experia_v10_auth_errors_total` - Failed logins
//! - `experia_v10_scrape_errors_total` - Failed requests during scrapes
//! - `experia_v10_permission_errors_total` - Permission-denied replies
//!
//! ## WAN
//! - `experia_v10_internet_connection` - 1 when connected, labelled with
//!   link type, protocol, state, IP and MAC
//!
//! ## Per Interface (label `ifname`)
//! - `experia_v10_netdev_up`, `_mtu`, `_tx_queue_len`, `_speed_mbps`,
//!   `_last_change_seconds`, `_info`
//! - `experia_v10_netdev_port_*` - Port bit rates, duplex and low-level link
//! - `experia_v10_netdev_*_total` - The 21 `getNetDevStats` counters
//!
//! # Example
//!
//! ```no_run
//! use experia_v10_exporter::metrics::MetricsRegistry;
//! use experia_v10_exporter::scrape::{default_candidates, Exporter};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let exporter = Exporter::new(
//!     "http://192.168.2.254",
//!     "admin",
//!     "secret",
//!     Duration::from_secs(5),
//!     default_candidates(),
//! )
//! .expect("Failed to build exporter");
//!
//! let registry = MetricsRegistry::new();
//! registry
//!     .register_exporter(Arc::new(exporter))
//!     .expect("Failed to register exporter");
//! println!("{}", registry.encode().expect("Failed to encode"));
//! ```

mod collector;
mod families;
mod instruments;
#[cfg(feature = "server")]
mod server;

pub use collector::{encode_observations, ExporterCollector, MetricsError, MetricsRegistry};
pub use families::{Family, Observation, Source, METRIC_PREFIX};
pub use instruments::Instruments;
#[cfg(feature = "server")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};

//! Experia Box V10 Prometheus Exporter
//!
//! Scrapes the management API of an Experia Box V10 router and exposes WAN
//! status plus per-interface link and traffic data as Prometheus metrics.
//!
//! # Architecture
//!
//! Each scrape cycle flows one way:
//!
//! ```text
//! session → protocol → transport → normalize → scrape → metrics
//!  (login)   (bodies)   (HTTP)      (JSON)     (cycle)   (sink)
//! ```
//!
//! # Design Principles
//!
//! - **Total output**: every family is emitted on every cycle, with zero or
//!   `Unknown` placeholders when the router gives nothing usable
//! - **Tolerant decoding**: replies are searched for the data rather than
//!   validated against one firmware's layout
//! - **Failures are metrics**: auth, request and permission failures are
//!   counted, never raised to the metrics endpoint
//!
//! # Example
//!
//! ```no_run
//! use experia_v10_exporter::{Exporter, ExporterConfig, MetricsRegistry};
//! use std::sync::Arc;
//!
//! let config = ExporterConfig {
//!     router_ip: "192.168.2.254".to_string(),
//!     username: "admin".to_string(),
//!     password: "secret".to_string(),
//!     ..Default::default()
//! };
//! config.validate().unwrap();
//!
//! let exporter = Arc::new(Exporter::from_config(&config).unwrap());
//! if let Err(e) = exporter.login() {
//!     eprintln!("login failed, retrying on first scrape: {e}");
//! }
//!
//! let registry = MetricsRegistry::new();
//! registry.register_exporter(exporter).unwrap();
//! print!("{}", registry.encode().unwrap());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod normalize;
pub mod protocol;
pub mod scrape;
pub mod session;
pub mod transport;

// Re-export commonly used types at crate root
pub use config::{ConfigError, ConfigOverrides, ExporterConfig};
pub use metrics::{MetricsError, MetricsRegistry};
pub use normalize::{MibInfo, NormalizedRecord};
pub use scrape::{Exporter, ExporterError, InterfaceCandidate};
pub use session::{AuthError, Authenticator, SessionContext};
pub use transport::{HttpTransport, TransportError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

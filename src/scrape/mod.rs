//! Scrape orchestration.
//!
//! An [`Exporter`] owns the transport, the authenticator and its own health
//! instruments. Each call to [`Exporter::scrape`] runs one cycle:
//!
//! ```text
//! session? ──no──> login ──fail──> placeholders only
//!    │                 │
//!   yes ──────────────ok
//!    │
//!    ├─> getWANStatus
//!    └─> for each candidate: getMIBs ─> getNetDevStats
//! ```
//!
//! Every cycle yields one observation per family and candidate, whatever
//! fails along the way.

mod candidates;
mod observations;
mod orchestrator;

pub use candidates::{
    candidates_from, default_candidates, parse_candidate_list, stable_label, InterfaceCandidate,
    DEFAULT_CANDIDATES,
};
pub use observations::{
    interface_placeholders, mib_observations, stats_observations, wan_observation,
};
pub use orchestrator::{Exporter, ExporterError};

//! Interface candidates probed on every scrape.
//!
//! The exported `ifname` label comes from the candidate's position in the
//! list (`eth1` for the first entry), never from the device reply. Reordering
//! the list therefore changes which physical port is reported under a label.

/// Device identifiers probed when nothing else is configured.
pub const DEFAULT_CANDIDATES: [&str; 4] = ["ETH0", "ETH1", "ETH2", "ETH3"];

/// A device-side interface identifier and its exported label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceCandidate {
    device_id: String,
    label: String,
}

impl InterfaceCandidate {
    /// Creates the candidate at zero-based `position`.
    ///
    /// The identifier is trimmed and upper-cased.
    pub fn new(device_id: &str, position: usize) -> Self {
        Self {
            device_id: device_id.trim().to_uppercase(),
            label: stable_label(position),
        }
    }

    /// Identifier used in service names, e.g. `ETH0`.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Exported `ifname` label, e.g. `eth1`.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// `eth<position + 1>`.
pub fn stable_label(position: usize) -> String {
    format!("eth{}", position + 1)
}

/// Builds candidates from identifiers in order.
///
/// Blank entries are dropped before positions are assigned.
pub fn candidates_from<I, S>(ids: I) -> Vec<InterfaceCandidate>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .filter(|id| !id.as_ref().trim().is_empty())
        .enumerate()
        .map(|(position, id)| InterfaceCandidate::new(id.as_ref(), position))
        .collect()
}

/// Parses a comma-separated list such as `eth0, eth2`.
pub fn parse_candidate_list(raw: &str) -> Vec<InterfaceCandidate> {
    candidates_from(raw.split(','))
}

/// The four default candidates, `ETH0`..`ETH3`.
pub fn default_candidates() -> Vec<InterfaceCandidate> {
    candidates_from(DEFAULT_CANDIDATES)
}

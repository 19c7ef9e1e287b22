//! Response normalization.
//!
//! Router replies nest the same data at different depths and with different
//! key casing depending on firmware. This module finds the interesting
//! section, flattens the candidate's entries into a [`NormalizedRecord`]
//! with case-insensitive lookups, and builds typed views on top of it.
//! Missing data is `None`, never an error; only undecodable JSON fails.

mod locate;
mod record;
mod typed;

pub use locate::{
    candidate_entry, extract_candidate_record, locate_status_section, member,
    parse_net_dev_stats_record, section_alias, section_status, MAX_SEARCH_DEPTH,
};
pub use record::{as_bool, as_float, as_str, NormalizedRecord};
pub use typed::{parse_mibs, parse_net_dev_stats, MibInfo, PortParams};

//! Locating the interface data inside a decoded reply.
//!
//! Firmware versions wrap the `base`/`netdev` maps at different depths
//! (`status`, `data.status`, the root itself). The search below finds the
//! first object carrying either key and never fails: a document without one
//! simply has no data for the cycle.

use super::record::{as_bool, as_str, NormalizedRecord};
use serde_json::{Map, Value};

/// Deepest nesting level the section search descends to.
pub const MAX_SEARCH_DEPTH: usize = 8;

/// Section holding the per-interface attribute maps.
pub const BASE_KEY: &str = "base";
/// Section holding the netdev attribute maps; overrides `base`.
pub const NETDEV_KEY: &str = "netdev";
/// Section holding interface aliases.
pub const ALIAS_KEY: &str = "alias";

/// Finds the object that carries the `base` or `netdev` map.
///
/// Depth-first, in document order, bounded by [`MAX_SEARCH_DEPTH`]. When
/// nothing matches, a top-level `status` object is returned, then a
/// top-level `data` object.
pub fn locate_status_section(document: &Value) -> Option<&Map<String, Value>> {
    if let Some(found) = search(document, 0) {
        return Some(found);
    }
    let root = document.as_object()?;
    ["status", "data"]
        .iter()
        .find_map(|key| member(root, key).and_then(Value::as_object))
}

fn search(value: &Value, depth: usize) -> Option<&Map<String, Value>> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            if member(map, BASE_KEY).is_some() || member(map, NETDEV_KEY).is_some() {
                return Some(map);
            }
            map.values().find_map(|child| search(child, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|child| search(child, depth + 1)),
        _ => None,
    }
}

/// Looks `key` up exactly, then case-insensitively.
pub fn member<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// The candidate's object inside `section[subsection]`.
///
/// Keys match case-insensitively. When no key matches and the subsection
/// has exactly one entry, that entry is taken as the candidate's data.
pub fn candidate_entry<'a>(
    section: &'a Map<String, Value>,
    subsection: &str,
    candidate: &str,
) -> Option<&'a Map<String, Value>> {
    let entries = member(section, subsection)?.as_object()?;
    if let Some(entry) = member(entries, candidate) {
        return entry.as_object();
    }
    if entries.len() == 1 {
        return entries.values().next().and_then(Value::as_object);
    }
    None
}

/// Merges the candidate's `base` and `netdev` entries into one record.
///
/// `netdev` fields win on collision. `None` if neither subsection has an
/// entry for the candidate.
pub fn extract_candidate_record(
    section: &Map<String, Value>,
    candidate: &str,
) -> Option<NormalizedRecord> {
    let base = candidate_entry(section, BASE_KEY, candidate);
    let netdev = candidate_entry(section, NETDEV_KEY, candidate);
    if base.is_none() && netdev.is_none() {
        return None;
    }

    let mut record = NormalizedRecord::new();
    if let Some(base) = base {
        record.merge(base);
    }
    if let Some(netdev) = netdev {
        record.merge(netdev);
    }
    Some(record)
}

/// Boolean `Status` carried by the section itself.
pub fn section_status(section: &Map<String, Value>) -> Option<bool> {
    member(section, "Status").and_then(as_bool)
}

/// Alias from `alias.<candidate>.Alias`, falling back to `alias.Alias`.
pub fn section_alias<'a>(section: &'a Map<String, Value>, candidate: &str) -> Option<&'a str> {
    let aliases = member(section, ALIAS_KEY)?.as_object()?;
    member(aliases, candidate)
        .and_then(Value::as_object)
        .and_then(|entry| member(entry, "Alias"))
        .and_then(as_str)
        .or_else(|| member(aliases, "Alias").and_then(as_str))
}

/// Flat counter map of a `getNetDevStats` reply.
///
/// Prefers a `data` object, then a `status` object, then the root.
pub fn parse_net_dev_stats_record(document: &Value) -> Option<NormalizedRecord> {
    let root = document.as_object()?;
    let counters = ["data", "status"]
        .iter()
        .find_map(|key| member(root, key).and_then(Value::as_object))
        .unwrap_or(root);
    Some(NormalizedRecord::from_object(counters))
}

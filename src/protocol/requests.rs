//! Request bodies for the router's remote procedures.
//!
//! Field order and casing are part of the wire contract: firmware compares
//! these bodies closely, so they are built with an insertion-ordered map.

use serde_json::json;

/// Service used for login.
pub const LOGIN_SERVICE: &str = "sah.Device.Information";
/// Service reporting WAN connectivity.
pub const WAN_SERVICE: &str = "NMC";

/// Builds the `createContext` login call.
pub fn create_context(username: &str, password: &str) -> String {
    json!({
        "service": LOGIN_SERVICE,
        "method": "createContext",
        "parameters": {
            "applicationName": "webui",
            "username": username,
            "password": password,
        },
    })
    .to_string()
}

/// Builds the `getWANStatus` call.
pub fn wan_status() -> String {
    call(WAN_SERVICE, "getWANStatus")
}

/// Builds the per-interface `getMIBs` call.
pub fn mibs(candidate: &str) -> String {
    call(&interface_service(candidate), "getMIBs")
}

/// Builds the per-interface `getNetDevStats` call.
pub fn net_dev_stats(candidate: &str) -> String {
    call(&interface_service(candidate), "getNetDevStats")
}

/// `NeMo.Intf.<CANDIDATE>`, always upper-cased.
pub fn interface_service(candidate: &str) -> String {
    format!("NeMo.Intf.{}", candidate.to_uppercase())
}

fn call(service: &str, method: &str) -> String {
    json!({
        "service": service,
        "method": method,
        "parameters": {},
    })
    .to_string()
}

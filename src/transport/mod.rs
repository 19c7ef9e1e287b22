//! HTTP transport to the router.
//!
//! A thin wrapper over a pooled blocking `reqwest` client that carries the
//! router's authentication headers, a per-request timeout, and a shared
//! cookie store. Every non-2xx reply is surfaced as an error so callers can
//! treat it like a transport failure.

mod client;
mod cookies;

pub use client::{Credential, HttpTransport, TransportError, API_PATH, CONTENT_TYPE};
pub use cookies::{Cookie, SessionCookies};

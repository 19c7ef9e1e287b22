//! Host-keyed cookie store shared by every request to the router.
//!
//! Some firmware issues cookies whose names contain characters that strict
//! cookie parsers reject (for example `121adbc0/sessid`). `Set-Cookie`
//! headers are therefore parsed leniently: the `name=value` pair before the
//! first `;` is stored as-is and the remaining attributes are ignored, except
//! `Max-Age=0` which deletes the cookie.

use parking_lot::RwLock;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use std::collections::{BTreeMap, HashMap};

/// A single stored cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name, exactly as the device sent it.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

/// Cookies grouped by host name.
///
/// Ports and paths are not part of the key: the router serves every page
/// from a single origin.
#[derive(Debug, Default)]
pub struct SessionCookies {
    hosts: RwLock<HashMap<String, BTreeMap<String, String>>>,
}

/// Outcome of parsing one `Set-Cookie` header.
#[derive(Debug, PartialEq, Eq)]
enum SetCookie {
    Store { name: String, value: String },
    Remove { name: String },
}

impl SessionCookies {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one raw `Set-Cookie` header received from `url`.
    pub fn store(&self, url: &Url, set_cookie: &str) {
        let Some(host) = url.host_str() else {
            return;
        };
        let Some(parsed) = parse_set_cookie(set_cookie) else {
            tracing::debug!(header = set_cookie, "Ignoring unparseable Set-Cookie header");
            return;
        };

        let mut hosts = self.hosts.write();
        match parsed {
            SetCookie::Store { name, value } => {
                tracing::trace!(host, cookie = %name, "Stored cookie");
                hosts.entry(host.to_string()).or_default().insert(name, value);
            }
            SetCookie::Remove { name } => {
                if let Some(jar) = hosts.get_mut(host) {
                    jar.remove(&name);
                }
            }
        }
    }

    /// Returns the cookies stored for the host of `url`.
    pub fn cookies_for(&self, url: &Url) -> Vec<Cookie> {
        let Some(host) = url.host_str() else {
            return Vec::new();
        };
        self.hosts
            .read()
            .get(host)
            .map(|jar| {
                jar.iter()
                    .map(|(name, value)| Cookie {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Diagnostic accessor taking a textual URL such as `http://192.168.2.254`.
    ///
    /// Returns an empty list when the URL cannot be parsed.
    pub fn cookies_for_host(&self, host_url: &str) -> Vec<Cookie> {
        match Url::parse(host_url) {
            Ok(url) => self.cookies_for(&url),
            Err(_) => Vec::new(),
        }
    }

    /// Total number of cookies across all hosts.
    pub fn len(&self) -> usize {
        self.hosts.read().values().map(BTreeMap::len).sum()
    }

    /// Returns true if no cookie is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            let raw = String::from_utf8_lossy(header.as_bytes());
            self.store(url, &raw);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let cookies = self.cookies_for(url);
        if cookies.is_empty() {
            return None;
        }
        let joined = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }
}

fn parse_set_cookie(raw: &str) -> Option<SetCookie> {
    let mut parts = raw.split(';');
    let pair = parts.next()?.trim();
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let expired = parts.any(|attr| {
        attr.split_once('=')
            .map(|(k, v)| k.trim().eq_ignore_ascii_case("max-age") && v.trim() == "0")
            .unwrap_or(false)
    });

    if expired {
        Some(SetCookie::Remove {
            name: name.to_string(),
        })
    } else {
        Some(SetCookie::Store {
            name: name.to_string(),
            value: value.trim().to_string(),
        })
    }
}

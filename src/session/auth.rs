//! Login handshake and session token storage.

use crate::protocol::requests;
use crate::transport::{Cookie, Credential, HttpTransport, TransportError};
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors from a login attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed login response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("login response carried no contextID")]
    MissingContextId,
}

/// The session token issued by the router.
///
/// Empty until the first successful login. Later logins overwrite it.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    token: String,
}

impl SessionContext {
    /// The raw token; empty when no session exists.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns true if a token is held.
    pub fn is_established(&self) -> bool {
        !self.token.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct LoginReply {
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginData {
    #[serde(rename = "contextID", default)]
    context_id: Option<String>,
}

/// Performs the login handshake and hands out the current token.
///
/// The token sits behind a reader/writer lock: concurrent scrapes read it
/// without contention and a login excludes readers only while it stores
/// the new value. No retries are made here.
pub struct Authenticator {
    transport: Arc<HttpTransport>,
    username: String,
    password: String,
    session: RwLock<SessionContext>,
}

impl Authenticator {
    /// Creates an authenticator with no session.
    pub fn new(
        transport: Arc<HttpTransport>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            username: username.into(),
            password: password.into(),
            session: RwLock::new(SessionContext::default()),
        }
    }

    /// Logs in and stores the returned token.
    ///
    /// On success a GET of the router root is issued with the new token so
    /// that firmware which only sets session cookies on authenticated page
    /// loads does so. That request may fail without affecting the result.
    pub fn login(&self) -> Result<(), AuthError> {
        let body = requests::create_context(&self.username, &self.password);
        let raw = self.transport.post(Credential::Login, body)?;
        tracing::trace!(body = %String::from_utf8_lossy(&raw), "Login response");

        let reply: LoginReply = serde_json::from_slice(&raw)?;
        let token = reply
            .data
            .and_then(|d| d.context_id)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingContextId)?;

        self.session.write().token = token.clone();
        tracing::info!(
            router = self.transport.base_url(),
            token = %redact(&token),
            "Logged in to router"
        );

        if let Err(e) = self.transport.get_root(Credential::Session(&token)) {
            tracing::warn!(error = %e, "Session warm-up request failed");
        }
        Ok(())
    }

    /// Current session token, empty if there is none.
    pub fn session_token(&self) -> String {
        self.session.read().token.clone()
    }

    /// Returns true if a token is held.
    pub fn has_session(&self) -> bool {
        self.session.read().is_established()
    }

    /// Snapshot of the session context.
    pub fn session(&self) -> SessionContext {
        self.session.read().clone()
    }

    /// Drops the stored token so the next scrape logs in again.
    pub fn invalidate(&self) {
        self.session.write().token.clear();
    }

    /// Cookies the transport holds for `host_url`; empty if the URL is invalid.
    pub fn cookies_for_host(&self, host_url: &str) -> Vec<Cookie> {
        self.transport.cookies().cookies_for_host(host_url)
    }

    /// The transport this authenticator logs in through.
    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("username", &self.username)
            .field("has_session", &self.has_session())
            .finish_non_exhaustive()
    }
}

/// First few characters of a secret, for logs.
fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}…")
}

//! Session lifecycle against the router.
//!
//! Login exchanges credentials for an opaque `contextID` token which every
//! later call carries. The token is stored once and reused until a caller
//! clears it; expiry is left to the router to signal.

mod auth;

pub use auth::{AuthError, Authenticator, SessionContext};

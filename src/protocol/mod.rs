//! Wire format of the router API: request builders and typed replies.

pub mod requests;
mod wan;

pub use wan::{ApiError, WanData, WanStatus, UNKNOWN_STATE};

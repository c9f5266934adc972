//! Error handling for compbridge.
//!
//! All fallible operations in the crate return [`Result`], whose error type
//! [`BridgeError`] wraps the per-area error enums:
//! - codec errors ([`DecodeError`](crate::codec::DecodeError),
//!   [`EncodeError`](crate::codec::EncodeError))
//! - provider process errors
//! - configuration errors
//!
//! The completion dispatcher never lets these reach the host shell; they are
//! logged and turned into "no matches" or a single popup message.

pub mod kinds;

// Re-export commonly used types
pub use kinds::{BridgeError, ConfigError, ProcessError, Result};

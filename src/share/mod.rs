//! Share module for Loft.
//!
//! Shares grant access to a file or folder subtree through a record ID plus
//! an access code, with an optional expiry. Expiry is a predicate evaluated
//! on every access, never a stored state.

mod record;
mod repository;
mod service;

pub use record::{generate_code, NewShare, ShareRecord};
pub use repository::ShareRepository;
pub use service::{ShareAccess, ShareMetadata, ShareService};

/// Length of generated access codes.
pub const SHARE_CODE_LENGTH: usize = 4;

/// TTL sentinel meaning "never expires".
pub const TTL_NEVER: i64 = -1;

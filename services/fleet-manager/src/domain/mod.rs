//! Domain layer: pure types and rules with no I/O.
//!
//! Nothing here imports from `crate::application`, `crate::infra`,
//! `crate::api`, `tokio`, or any network client.

pub mod error;
pub mod guest_os;
pub mod outcome;
pub mod usage;

pub use error::{DestroyError, validate_cleanup_request};
pub use outcome::BestEffort;
pub use usage::{UsageTiers, classify_usage};

//! Exposure Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the exposure feed workspace.
//!
//! # Overview
//!
//! - **Error Handling**: `CommonError` and its result alias
//! - **Digests**: compact content digests used as persistent identifiers
//! - **Atomic writes**: all-or-nothing replacement of published files
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use exposure_common::{atomic::write_atomic, digest::md5_base64};
//!
//! fn publish(body: &str) -> exposure_common::Result<()> {
//!     let id = md5_base64(body);
//!     write_atomic("feed-id.txt", id.as_bytes())
//! }
//! ```

pub mod atomic;
pub mod digest;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CommonError, Result};

//! Shared foundational types used across the `tsl` incremental type-check engine.
//!
//! This crate provides content hashing for text-change detection and the
//! internal-error result type used for invariant violations.

#![warn(missing_docs)]

pub mod hash;
pub mod result;

pub use hash::ContentHash;
pub use result::{InternalError, TslResult};

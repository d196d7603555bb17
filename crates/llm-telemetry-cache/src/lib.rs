//! Caching utilities for LLM agent telemetry.
//!
//! This crate provides the two independent stores consumed by the telemetry
//! export path and by framework adapters:
//!
//! - [`CorrelationCache`] — a bounded FIFO map that pairs an outstanding tool
//!   call with the call identifier a later tool-result event must be matched
//!   against.
//! - [`TokenCache`] — a thread-safe, per-(agent, tenant) memoization of the
//!   token generators used to authenticate telemetry export.
//!
//! Both stores are designed for concurrent access from multiple threads and
//! use internal locking; neither ever blocks on network I/O while holding a
//! lock.

pub mod correlation;
pub mod error;
pub mod token;

pub use correlation::CorrelationCache;
pub use error::{CacheError, Result};
pub use token::{TokenCache, TokenGenerator};

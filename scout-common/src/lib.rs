//! Shared building blocks for the Scout crates.
//!
//! # Overview
//!
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`retry`]: bounded retries with a retryable/fatal error predicate
//!
//! # Examples
//!
//! ```rust
//! use scout_common::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.max_attempts, 5);
//! ```
pub mod observability;
pub mod retry;

pub use retry::{retry_bounded, RetryError, RetryPolicy};

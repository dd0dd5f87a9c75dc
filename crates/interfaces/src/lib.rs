#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! A collection of shared traits and error types for lith components.
//!
//! ## Feature Flags
//!
//! - `test-utils`: Export utilities for testing

/// Content-addressed store abstraction.
pub mod db;

/// P2P traits.
pub mod p2p;

/// Common test helpers for mocking out stores and peer clients.
#[cfg(feature = "test-utils")]
pub mod test_utils;

//! Shared test utilities for smb integration tests.
//!
//! This crate provides:
//! - [`DescriptorFactory`]: descriptors with sensible defaults
//! - Record fixtures in every supported record family
//! - Custom assertion helpers
//!
//! # Example
//!
//! ```rust
//! use smb_test_utils::{DescriptorFactory, assert_compatible};
//!
//! let factory = DescriptorFactory::by_key("user_id");
//! assert_compatible(&factory.buckets(2), &factory.buckets(8));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("smb_core=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

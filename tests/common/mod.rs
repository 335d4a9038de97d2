//! Common test utilities for rocmlens integration tests
//!
//! Fixtures build dispatch timelines, symbol tables and trace bundles from
//! compact tuples so each test file states only what it checks.

// Not every test binary uses every helper
#![allow(dead_code)]

mod fixtures;
mod tempfile_helpers;

pub use fixtures::*;
pub use serial_test::serial;
pub use tempfile_helpers::*;

//! Common test infrastructure shared across integration tests.
//!
//! This module provides:
//! - `stubs`: Recording collaborator stubs and the `StubConfig` marker
//! - `test_utils`: Session construction helpers and unit fixtures
//!
//! # Usage
//!
//! From any integration test file:
//! ```ignore
//! #[path = "common/mod.rs"]
//! mod common;
//! use common::{harness, Harness};
//! ```

// Each integration crate uses a different subset of the helpers.
#![allow(dead_code)]

pub mod stubs;
pub mod test_utils;

#[allow(unused_imports)]
pub use test_utils::{harness, harness_with, roster_events, Harness};

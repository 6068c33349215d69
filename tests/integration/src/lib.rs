//! Integration test utilities for the reaction engine
//!
//! This crate provides a wired in-memory harness and entity builders for
//! end-to-end reconciliation tests.

pub mod helpers;
pub mod fixtures;

pub use helpers::*;
pub use fixtures::*;

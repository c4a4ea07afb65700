//! # Conquest Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Board and game fixtures
//! - Battle odds for balance checks
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod balance;
pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;

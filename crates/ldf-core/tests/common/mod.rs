//! Shared test infrastructure for the LDF integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod tracing;

pub use fixtures::{dynamic_uniform, static_pools, test_constants, PoolFixture};
pub use tracing::init_test_tracing;

//! # LDF Core - Liquidity Density Functions
//!
//! This crate contains the liquidity shaping and swap math shared by pool
//! programs and off-chain clients. It provides:
//!
//! - Fixed-point primitives (Q96 sqrt prices, 512-bit `mul_div`, tick math)
//! - Distribution families mapping rounded ticks to liquidity density
//! - Shift-mode resolution for distributions following a reference tick
//! - An LDF facade dispatching over the distribution families
//! - A swap engine pricing trades against an LDF
//! - TOML pool configuration
//!
//! All evaluation is pure: persisted LDF state goes in with each call and the
//! updated state comes back out.

pub mod config;
pub mod constants;
pub mod distributions;
pub mod errors;
pub mod ldf;
pub mod math;
pub mod swap;
pub mod types;

// Re-export commonly used items
pub use config::PoolConfig;
pub use constants::*;
pub use errors::{CoreResult, LdfCoreError};
pub use ldf::{DecodedParams, LdfContext, LiquidityDensityFunction, ResolvedLdf};
pub use swap::{compute_balances, compute_swap, total_liquidity_from_balances};
pub use types::*;

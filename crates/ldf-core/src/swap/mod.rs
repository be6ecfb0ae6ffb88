//! # Swap Engine
//!
//! Prices trades against the liquidity an LDF spreads over the tick range.

pub mod balances;
pub mod swap_math;

pub use balances::{balances_at, compute_balances, total_liquidity_from_balances};
pub use swap_math::compute_swap;

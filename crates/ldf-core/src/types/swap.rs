//! # Swap Types
//!
//! Inputs and outputs of the LDF swap engine.

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::ldf::LiquidityDensityFunction;
use crate::types::LdfState;

/// Everything the swap engine needs to price one trade against a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapInput {
    pub tick_spacing: i32,
    /// Current tick of the pool
    pub tick: i32,
    /// Current sqrt price in Q96
    pub sqrt_price_x96: U256,
    /// Total liquidity the LDF distributes
    pub total_liquidity: u128,
    /// Swap token0 for token1 (price moves down)
    pub zero_for_one: bool,
    /// `amount_specified` is an input amount when set, an output amount otherwise
    pub exact_in: bool,
    pub amount_specified: U256,
    /// Price beyond which the swap stops
    pub sqrt_price_limit_x96: U256,
    /// Reference tick dynamic distributions anchor to
    pub reference_tick: i32,
    pub ldf: LiquidityDensityFunction,
    pub ldf_state: LdfState,
}

/// Outcome of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutput {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub amount_in: U256,
    pub amount_out: U256,
    /// State to persist for the next evaluation
    pub ldf_state: LdfState,
    /// Anchor moved during this evaluation
    pub should_surge: bool,
}

/// Active token balances implied by an LDF at a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LdfBalances {
    pub balance0: U256,
    pub balance1: U256,
    /// Token0 per Q96 liquidity
    pub density0_x96: U256,
    /// Token1 per Q96 liquidity
    pub density1_x96: U256,
}

//! # Liquidity Math
//!
//! Constant-liquidity formulas in Q96: token amount deltas between two sqrt
//! prices, the next sqrt price after adding or removing an amount, and a
//! fee-free swap step toward a target price.

use ethnum::U256;

use crate::constants::Q96;
use crate::errors::{CoreResult, LdfCoreError};
use crate::math::big_int::{div_rounding, mul_div, Rounding};

/// Calculate amount0 delta between two sqrt prices for Q96 precision
///
/// amount0 = L * (sqrtB - sqrtA) / (sqrtA * sqrtB)
pub fn get_amount0_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> CoreResult<U256> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        return get_amount0_delta(sqrt_ratio_b_x96, sqrt_ratio_a_x96, liquidity, round_up);
    }
    if sqrt_ratio_a_x96 == U256::ZERO {
        return Err(LdfCoreError::InvalidSqrtPrice);
    }

    let numerator1 = U256::new(liquidity) << 96u32;
    let numerator2 = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;
    let rounding = Rounding::up_if(round_up);

    let intermediate = mul_div(numerator1, numerator2, sqrt_ratio_b_x96, rounding)?;
    div_rounding(intermediate, sqrt_ratio_a_x96, rounding)
}

/// Calculate amount1 delta between two sqrt prices for Q96 precision
///
/// amount1 = L * (sqrtB - sqrtA)
pub fn get_amount1_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> CoreResult<U256> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        return get_amount1_delta(sqrt_ratio_b_x96, sqrt_ratio_a_x96, liquidity, round_up);
    }

    mul_div(
        U256::new(liquidity),
        sqrt_ratio_b_x96 - sqrt_ratio_a_x96,
        Q96,
        Rounding::up_if(round_up),
    )
}

/// Get the next sqrt price from a given amount of token0
///
/// Always rounds up: moving down the price for an input must not overshoot,
/// moving up for an output must not undershoot.
pub fn get_next_sqrt_price_from_amount0_rounding_up(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> CoreResult<U256> {
    if amount == U256::ZERO {
        return Ok(sqrt_price_x96);
    }
    if liquidity == 0 || sqrt_price_x96 == U256::ZERO {
        return Err(LdfCoreError::DivisionByZero);
    }

    let numerator1 = U256::new(liquidity) << 96u32;

    if add {
        if let Some(product) = amount.checked_mul(sqrt_price_x96) {
            if let Some(denominator) = numerator1.checked_add(product) {
                return mul_div(numerator1, sqrt_price_x96, denominator, Rounding::Up);
            }
        }
        // Fallback: L / (L / sqrtP + amount), less precise but overflow free
        let denominator = (numerator1 / sqrt_price_x96)
            .checked_add(amount)
            .ok_or(LdfCoreError::MathOverflow)?;
        div_rounding(numerator1, denominator, Rounding::Up)
    } else {
        let product = amount
            .checked_mul(sqrt_price_x96)
            .ok_or(LdfCoreError::MathOverflow)?;
        if numerator1 <= product {
            return Err(LdfCoreError::MathUnderflow);
        }
        mul_div(numerator1, sqrt_price_x96, numerator1 - product, Rounding::Up)
    }
}

/// Get the next sqrt price from a given amount of token1
///
/// Always rounds down, mirroring the token0 variant.
pub fn get_next_sqrt_price_from_amount1_rounding_down(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> CoreResult<U256> {
    if liquidity == 0 {
        return Err(LdfCoreError::DivisionByZero);
    }
    let liquidity = U256::new(liquidity);

    if add {
        let quotient = mul_div(amount, Q96, liquidity, Rounding::Down)?;
        sqrt_price_x96
            .checked_add(quotient)
            .ok_or(LdfCoreError::MathOverflow)
    } else {
        let quotient = mul_div(amount, Q96, liquidity, Rounding::Up)?;
        if sqrt_price_x96 <= quotient {
            return Err(LdfCoreError::MathUnderflow);
        }
        Ok(sqrt_price_x96 - quotient)
    }
}

/// Next sqrt price after an exact input amount
pub fn get_next_sqrt_price_from_input(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> CoreResult<U256> {
    if zero_for_one {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// Next sqrt price after an exact output amount
pub fn get_next_sqrt_price_from_output(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> CoreResult<U256> {
    if zero_for_one {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_out, false)
    }
}

/// Result of a single constant-liquidity swap step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    pub sqrt_price_next_x96: U256,
    pub amount_in: U256,
    pub amount_out: U256,
}

/// Compute a fee-free swap step toward `sqrt_price_target_x96`
///
/// The direction is implied by the target: a target at or below the current
/// price swaps token0 for token1. `amount_remaining` is an input amount when
/// `exact_in` is set and an output amount otherwise.
pub fn compute_swap_step(
    sqrt_price_current_x96: U256,
    sqrt_price_target_x96: U256,
    liquidity: u128,
    amount_remaining: U256,
    exact_in: bool,
) -> CoreResult<SwapStep> {
    let zero_for_one = sqrt_price_current_x96 >= sqrt_price_target_x96;

    let mut amount_in = U256::ZERO;
    let mut amount_out = U256::ZERO;

    let sqrt_price_next_x96 = if exact_in {
        amount_in = if zero_for_one {
            get_amount0_delta(sqrt_price_target_x96, sqrt_price_current_x96, liquidity, true)?
        } else {
            get_amount1_delta(sqrt_price_current_x96, sqrt_price_target_x96, liquidity, true)?
        };
        if amount_remaining >= amount_in {
            sqrt_price_target_x96
        } else {
            get_next_sqrt_price_from_input(
                sqrt_price_current_x96,
                liquidity,
                amount_remaining,
                zero_for_one,
            )?
        }
    } else {
        amount_out = if zero_for_one {
            get_amount1_delta(sqrt_price_target_x96, sqrt_price_current_x96, liquidity, false)?
        } else {
            get_amount0_delta(sqrt_price_current_x96, sqrt_price_target_x96, liquidity, false)?
        };
        if amount_remaining >= amount_out {
            sqrt_price_target_x96
        } else {
            get_next_sqrt_price_from_output(
                sqrt_price_current_x96,
                liquidity,
                amount_remaining,
                zero_for_one,
            )?
        }
    };

    let reached_target = sqrt_price_next_x96 == sqrt_price_target_x96;

    // Recompute whichever amounts were not pinned by reaching the target
    if zero_for_one {
        if !(reached_target && exact_in) {
            amount_in =
                get_amount0_delta(sqrt_price_next_x96, sqrt_price_current_x96, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            amount_out =
                get_amount1_delta(sqrt_price_next_x96, sqrt_price_current_x96, liquidity, false)?;
        }
    } else {
        if !(reached_target && exact_in) {
            amount_in =
                get_amount1_delta(sqrt_price_current_x96, sqrt_price_next_x96, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            amount_out =
                get_amount0_delta(sqrt_price_current_x96, sqrt_price_next_x96, liquidity, false)?;
        }
    }

    // Exact output never pays out more than requested
    if !exact_in && amount_out > amount_remaining {
        amount_out = amount_remaining;
    }

    Ok(SwapStep {
        sqrt_price_next_x96,
        amount_in,
        amount_out,
    })
}

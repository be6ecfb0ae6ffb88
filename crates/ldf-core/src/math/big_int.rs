//! Big integer operations for high-precision math
//!
//! `ethnum::U256` carries every fixed-point value in the crate. Products of two
//! 256-bit values are formed in 512 bits so that `mul_div` only fails when the
//! final quotient itself does not fit.

use ethnum::U256;

use crate::errors::{CoreResult, LdfCoreError};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

impl Rounding {
    /// Pick a rounding mode from a boolean flag
    pub const fn up_if(round_up: bool) -> Self {
        if round_up {
            Rounding::Up
        } else {
            Rounding::Down
        }
    }
}

const LOW_MASK: U256 = U256::new(u128::MAX);

/// Multiply two U256 values into a 512-bit product, returned as `(hi, lo)`
pub fn full_mul(a: U256, b: U256) -> (U256, U256) {
    let (a1, a0) = (a >> 128u32, a & LOW_MASK);
    let (b1, b0) = (b >> 128u32, b & LOW_MASK);

    // Each partial product is a u128 x u128 multiplication and fits in 256 bits
    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    let (mid, mid_carry) = p01.overflowing_add(p10);
    let (lo, lo_carry) = p00.overflowing_add(mid << 128u32);

    let mut hi = p11 + (mid >> 128u32);
    if mid_carry {
        hi += U256::ONE << 128u32;
    }
    if lo_carry {
        hi += U256::ONE;
    }

    (hi, lo)
}

/// Divide a 512-bit value by a 256-bit denominator, returning `(quotient, remainder)`
fn div_rem_512(hi: U256, lo: U256, denominator: U256) -> CoreResult<(U256, U256)> {
    if denominator == U256::ZERO {
        return Err(LdfCoreError::DivisionByZero);
    }
    if hi == U256::ZERO {
        return Ok((lo / denominator, lo % denominator));
    }
    // Quotient would not fit in 256 bits
    if hi >= denominator {
        return Err(LdfCoreError::MulDivOverflow);
    }

    // Restoring long division over the low word, remainder seeded with the high word
    let mut remainder = hi;
    let mut quotient = U256::ZERO;
    for bit in (0..256u32).rev() {
        let carry = remainder >> 255u32 != U256::ZERO;
        remainder = (remainder << 1u32) | ((lo >> bit) & U256::ONE);
        if carry || remainder >= denominator {
            remainder = remainder.wrapping_sub(denominator);
            quotient |= U256::ONE << bit;
        }
    }

    Ok((quotient, remainder))
}

/// Multiply two values and divide by a third with specified rounding
/// result = (a * b) / denominator
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> CoreResult<U256> {
    let (hi, lo) = full_mul(a, b);
    let (quotient, remainder) = div_rem_512(hi, lo, denominator)?;

    if rounding == Rounding::Up && remainder != U256::ZERO {
        return quotient
            .checked_add(U256::ONE)
            .ok_or(LdfCoreError::MulDivOverflow);
    }

    Ok(quotient)
}

/// `mul_div` rounding down
pub fn mul_div_down(a: U256, b: U256, denominator: U256) -> CoreResult<U256> {
    mul_div(a, b, denominator, Rounding::Down)
}

/// `mul_div` rounding up
pub fn mul_div_up(a: U256, b: U256, denominator: U256) -> CoreResult<U256> {
    mul_div(a, b, denominator, Rounding::Up)
}

/// Multiply two u128 values and divide by a third with specified rounding
pub fn mul_div_u128(a: u128, b: u128, denominator: u128, rounding: Rounding) -> CoreResult<u128> {
    let result = mul_div(U256::new(a), U256::new(b), U256::new(denominator), rounding)?;
    to_u128(result)
}

/// Divide with specified rounding
pub fn div_rounding(numerator: U256, denominator: U256, rounding: Rounding) -> CoreResult<U256> {
    if denominator == U256::ZERO {
        return Err(LdfCoreError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    if rounding == Rounding::Up && numerator % denominator != U256::ZERO {
        return Ok(quotient + U256::ONE);
    }
    Ok(quotient)
}

/// Convert to u128, failing if the value does not fit
pub fn to_u128(value: U256) -> CoreResult<u128> {
    let (hi, lo) = value.into_words();
    if hi != 0 {
        return Err(LdfCoreError::ConversionError);
    }
    Ok(lo)
}

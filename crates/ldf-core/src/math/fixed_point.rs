//! # Fixed-Point Arithmetic
//!
//! Q96 and WAD fixed-point helpers: exponentiation, logarithms and the rounding
//! policy used when an inverted series yields a fractional tick index.
//!
//! Everything is integer-only. Powers are only ever taken of bases not above
//! the unit, so `rpow` stays bounded for the exponents the distributions use.

use ethnum::U256;

use crate::constants::{ALPHA_BASE, INDEX_ROUNDING_RESOLUTION_WAD, LN2_WAD, Q96, WAD};
use crate::errors::{CoreResult, LdfCoreError};
use crate::math::big_int::{mul_div, to_u128, Rounding};

// ============================================================================
// Conversions
// ============================================================================

/// Convert an 8-decimal alpha into Q96
pub fn alpha_to_x96(alpha: u32) -> CoreResult<U256> {
    mul_div(U256::from(alpha), Q96, U256::from(ALPHA_BASE), Rounding::Down)
}

/// Convert a ratio `numerator / denominator` into Q96
pub fn ratio_to_x96(numerator: u64, denominator: u64) -> CoreResult<U256> {
    mul_div(U256::from(numerator), Q96, U256::from(denominator), Rounding::Down)
}

/// Multiply two Q96 values
pub fn mul_q96(a: U256, b: U256, rounding: Rounding) -> CoreResult<U256> {
    mul_div(a, b, Q96, rounding)
}

/// Divide two Q96 values
pub fn div_q96(a: U256, b: U256, rounding: Rounding) -> CoreResult<U256> {
    mul_div(a, Q96, b, rounding)
}

/// Absolute distance between two unsigned values
pub fn dist(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Absolute distance between two ticks
pub fn abs_diff_ticks(a: i32, b: i32) -> u32 {
    a.abs_diff(b)
}

// ============================================================================
// Exponentiation
// ============================================================================

/// `base^exponent` scaled by `unit`, each intermediate product rounded half up
pub fn rpow(base: U256, exponent: u32, unit: U256) -> CoreResult<U256> {
    if unit == U256::ZERO {
        return Err(LdfCoreError::DivisionByZero);
    }
    if base == U256::ZERO {
        return Ok(if exponent == 0 { unit } else { U256::ZERO });
    }

    let half = unit >> 1u32;
    let mut x = base;
    let mut n = exponent;
    let mut z = if n & 1 == 1 { x } else { unit };

    n >>= 1;
    while n > 0 {
        let xx = x.checked_mul(x).ok_or(LdfCoreError::MathOverflow)?;
        x = xx.checked_add(half).ok_or(LdfCoreError::MathOverflow)? / unit;

        if n & 1 == 1 {
            let zx = z.checked_mul(x).ok_or(LdfCoreError::MathOverflow)?;
            z = zx.checked_add(half).ok_or(LdfCoreError::MathOverflow)? / unit;
        }
        n >>= 1;
    }

    Ok(z)
}

/// `base^exponent` in Q96
pub fn rpow_q96(base: U256, exponent: u32) -> CoreResult<U256> {
    rpow(base, exponent, Q96)
}

// ============================================================================
// Logarithms
// ============================================================================

/// Binary logarithm of a Q96 value, returned as a signed Q64.64 number
pub fn log2_q96(x: U256) -> CoreResult<i128> {
    if x == U256::ZERO {
        return Err(LdfCoreError::InvalidLogarithmInput);
    }

    let msb = 255 - x.leading_zeros() as i32;
    let integer_part = (msb - 96) as i128;

    // Normalize into [2^127, 2^128)
    let mut r = if msb >= 127 {
        x >> (msb - 127) as u32
    } else {
        x << (127 - msb) as u32
    };

    let two_128 = U256::ONE << 128u32;
    let mut fraction: i128 = 0;
    for bit in (0..64u32).rev() {
        r = (r * r) >> 127u32;
        if r >= two_128 {
            r >>= 1u32;
            fraction |= 1i128 << bit;
        }
    }

    Ok((integer_part << 64) + fraction)
}

/// Natural logarithm of a Q96 value, returned in WAD
pub fn ln_q96(x: U256) -> CoreResult<i128> {
    let log2 = log2_q96(x)?;

    let integer_part = log2 >> 64;
    let fraction = log2 & ((1i128 << 64) - 1);

    let integer_ln = integer_part
        .checked_mul(LN2_WAD)
        .ok_or(LdfCoreError::MathOverflow)?;
    Ok(integer_ln + ((fraction * LN2_WAD) >> 64))
}

/// Ratio `ln(numerator_x96) / ln(denominator_x96)` in WAD
///
/// Both arguments must lie in `(0, Q96]` so the logarithms share a sign; the
/// result is therefore non-negative. Saturates at `i128::MAX`.
pub fn ln_ratio_wad(numerator_x96: U256, denominator_x96: U256) -> CoreResult<i128> {
    if numerator_x96 > Q96 || denominator_x96 >= Q96 {
        return Err(LdfCoreError::InvalidLogarithmInput);
    }
    let ln_numerator = ln_q96(numerator_x96)?;
    let ln_denominator = ln_q96(denominator_x96)?;
    if ln_denominator == 0 {
        return Err(LdfCoreError::DivisionByZero);
    }

    let ratio = mul_div(
        U256::from(ln_numerator.unsigned_abs()),
        U256::from(WAD as u128),
        U256::from(ln_denominator.unsigned_abs()),
        Rounding::Down,
    )?;
    Ok(to_u128(ratio)
        .ok()
        .and_then(|value| i128::try_from(value).ok())
        .unwrap_or(i128::MAX))
}

// ============================================================================
// Index Rounding
// ============================================================================

/// Round a WAD value to the nearest multiple of 1e-6, ties away from zero
pub fn round_x_wad(x_wad: i128) -> i128 {
    let resolution = INDEX_ROUNDING_RESOLUTION_WAD;
    let half = resolution / 2;
    let magnitude = x_wad.unsigned_abs();
    let rounded = (magnitude.saturating_add(half as u128) / resolution as u128) * resolution as u128;
    let rounded = i128::try_from(rounded).unwrap_or(i128::MAX);
    if x_wad < 0 {
        -rounded
    } else {
        rounded
    }
}

/// Convert a fractional WAD index into an integer index
///
/// The value is first snapped to 1e-6 resolution so that a result that is an
/// integer up to logarithm error does not get pushed to the neighbouring index.
pub fn x_wad_to_index(x_wad: i128, round_up: bool) -> i64 {
    let x = round_x_wad(x_wad);
    let quotient = x / WAD;
    let remainder = x % WAD;
    let index = if round_up && remainder > 0 {
        quotient + 1
    } else if !round_up && remainder < 0 {
        quotient - 1
    } else {
        quotient
    };
    index.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

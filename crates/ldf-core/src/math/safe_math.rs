//! # Safe Math Operations
//!
//! Overflow-checked arithmetic for ticks, indices and 256-bit amounts.

use ethnum::U256;

use crate::errors::{CoreResult, LdfCoreError};

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Division operations with zero check
    (div, $fn_name:ident, $type:ty, $zero:expr) => {
        /// Safe division with zero check
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            if b == $zero {
                return Err(LdfCoreError::DivisionByZero);
            }
            Ok(a / b)
        }
    };

    // Range-checked conversions
    (cast, $fn_name:ident, $from_type:ty, $to_type:ty) => {
        /// Checked conversion returning an error when the value does not fit
        pub fn $fn_name(value: $from_type) -> CoreResult<$to_type> {
            <$to_type>::try_from(value).map_err(|_| LdfCoreError::ConversionError)
        }
    };

    // Binary operations with checked methods, kept after the keyword arms
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        /// Checked operation returning an error on overflow/underflow
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };
}

// Tick arithmetic
safe_arith!(safe_add_i32, i32, checked_add, LdfCoreError::MathOverflow);
safe_arith!(safe_sub_i32, i32, checked_sub, LdfCoreError::MathUnderflow);
safe_arith!(safe_mul_i32, i32, checked_mul, LdfCoreError::MathOverflow);
safe_arith!(div, safe_div_i32, i32, 0);

// Amount arithmetic
safe_arith!(safe_add_u256, U256, checked_add, LdfCoreError::MathOverflow);
safe_arith!(safe_sub_u256, U256, checked_sub, LdfCoreError::MathUnderflow);
safe_arith!(safe_mul_u256, U256, checked_mul, LdfCoreError::MathOverflow);
safe_arith!(div, safe_div_u256, U256, U256::ZERO);

// Conversions
safe_arith!(cast, safe_cast_i64_to_i32, i64, i32);
safe_arith!(cast, safe_cast_i32_to_u32, i32, u32);
safe_arith!(cast, safe_cast_u32_to_i32, u32, i32);

/// Number of rounded ticks between two spacing-aligned ticks
pub fn tick_span(from: i32, to: i32, tick_spacing: i32) -> CoreResult<u32> {
    let diff = safe_sub_i32(to, from)?;
    safe_cast_i32_to_u32(safe_div_i32(diff, tick_spacing)?)
}

/// Tick reached after `steps` rounded ticks from `tick`
pub fn tick_offset(tick: i32, steps: u32, tick_spacing: i32) -> CoreResult<i32> {
    let steps = safe_cast_u32_to_i32(steps)?;
    safe_add_i32(tick, safe_mul_i32(steps, tick_spacing)?)
}

/// Saturating subtraction for amounts where a negative result means "nothing left"
pub fn saturating_sub_u256(a: U256, b: U256) -> U256 {
    a.saturating_sub(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_tick_arithmetic() {
        assert_eq!(safe_add_i32(1, 2), Ok(3));
        assert_eq!(safe_add_i32(i32::MAX, 1), Err(LdfCoreError::MathOverflow));
        assert_eq!(safe_sub_i32(i32::MIN, 1), Err(LdfCoreError::MathUnderflow));
        assert_eq!(safe_div_i32(5, 0), Err(LdfCoreError::DivisionByZero));
    }

    #[test]
    fn test_tick_span_and_offset() {
        assert_eq!(tick_span(-60, 120, 60), Ok(3));
        assert_eq!(tick_offset(-60, 3, 60), Ok(120));
        assert!(tick_span(120, -60, 60).is_err());
    }

    #[test]
    fn test_casts() {
        assert_eq!(safe_cast_i64_to_i32(5), Ok(5));
        assert!(safe_cast_i64_to_i32(i64::MAX).is_err());
        assert!(safe_cast_i32_to_u32(-1).is_err());
        assert_eq!(safe_cast_u32_to_i32(7), Ok(7));
    }

    #[test]
    fn test_amount_arithmetic() {
        let ten = U256::new(10);
        assert_eq!(safe_div_u256(ten, U256::new(3)), Ok(U256::new(3)));
        assert_eq!(safe_div_u256(ten, U256::ZERO), Err(LdfCoreError::DivisionByZero));
        assert_eq!(safe_mul_u256(U256::MAX, U256::new(2)), Err(LdfCoreError::MathOverflow));
        assert_eq!(safe_sub_u256(U256::ZERO, U256::ONE), Err(LdfCoreError::MathUnderflow));
        assert_eq!(safe_add_u256(ten, ten), Ok(U256::new(20)));
        assert_eq!(safe_mul_i32(-3, 4), Ok(-12));
    }
}

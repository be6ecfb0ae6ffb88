//! # Tick Math
//!
//! Conversions between ticks and sqrt prices using Q96 fixed-point precision,
//! plus the tick rounding helpers every distribution relies on.

use ethnum::U256;

use crate::constants::{
    MAX_SQRT_PRICE, MAX_TICK, MAX_TICK_SPACING, MIN_SQRT_PRICE, MIN_TICK, MIN_TICK_SPACING,
};
use crate::errors::{CoreResult, LdfCoreError};

/// sqrt(1.0001)^-(2^i) in Q128, for i = 1..19
const MAGIC_SQRT_RATIOS: [u128; 19] = [
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

/// sqrt(1.0001)^-1 in Q128
const MAGIC_SQRT_RATIO_ODD: u128 = 0xfffcb933bd6fad37aa2d162d1a594001;

/// Get sqrt price from tick using Q96 precision
pub fn get_sqrt_price_at_tick(tick: i32) -> CoreResult<U256> {
    if !is_tick_valid(tick) {
        return Err(LdfCoreError::InvalidTick(tick));
    }

    let abs_tick = tick.unsigned_abs();
    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::new(MAGIC_SQRT_RATIO_ODD)
    } else {
        U256::ONE << 128u32
    };

    // Binary decomposition of the tick using the magic constants
    for (i, magic) in MAGIC_SQRT_RATIOS.iter().enumerate() {
        if abs_tick & (1 << (i + 1)) != 0 {
            ratio = (ratio * U256::new(*magic)) >> 128u32;
        }
    }

    // Constants are reciprocal powers, so positive ticks invert the ratio
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128 -> Q96, rounding up so the result never underestimates the price
    let rounding = if ratio & U256::new(0xffff_ffff) == U256::ZERO {
        U256::ZERO
    } else {
        U256::ONE
    };
    Ok((ratio >> 32u32) + rounding)
}

/// Get tick from sqrt price using Q96 precision
///
/// Returns the greatest tick whose sqrt price is at most `sqrt_price`.
pub fn get_tick_at_sqrt_price(sqrt_price: U256) -> CoreResult<i32> {
    if !is_sqrt_price_valid(sqrt_price) {
        return Err(LdfCoreError::InvalidSqrtPrice);
    }

    // Binary search over the tick range, bounded by ~21 iterations
    let mut low = MIN_TICK;
    let mut high = MAX_TICK;

    while low < high {
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_price_at_tick(mid)? <= sqrt_price {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Ok(low)
}

/// Check if a tick is within the supported range
pub fn is_tick_valid(tick: i32) -> bool {
    (MIN_TICK..=MAX_TICK).contains(&tick)
}

/// Check if a Q96 sqrt price is within the supported range
pub fn is_sqrt_price_valid(sqrt_price: U256) -> bool {
    sqrt_price >= MIN_SQRT_PRICE && sqrt_price <= MAX_SQRT_PRICE
}

/// Check if a tick spacing is supported
pub fn is_tick_spacing_valid(tick_spacing: i32) -> bool {
    (MIN_TICK_SPACING..=MAX_TICK_SPACING).contains(&tick_spacing)
}

/// Round a tick down to the nearest multiple of the tick spacing
pub fn round_tick_single(tick: i32, tick_spacing: i32) -> i32 {
    tick.div_euclid(tick_spacing) * tick_spacing
}

/// Rounded tick containing `tick` and the rounded tick right after it
pub fn round_tick(tick: i32, tick_spacing: i32) -> (i32, i32) {
    let rounded = round_tick_single(tick, tick_spacing);
    (rounded, rounded + tick_spacing)
}

/// Smallest tick aligned to the spacing that is within the tick range
pub fn min_usable_tick(tick_spacing: i32) -> i32 {
    (MIN_TICK / tick_spacing) * tick_spacing
}

/// Largest tick aligned to the spacing that is within the tick range
pub fn max_usable_tick(tick_spacing: i32) -> i32 {
    (MAX_TICK / tick_spacing) * tick_spacing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q96;

    #[test]
    fn test_tick_to_sqrt_price_conversion() {
        assert_eq!(get_sqrt_price_at_tick(0).unwrap(), Q96);
        assert_eq!(get_sqrt_price_at_tick(MIN_TICK).unwrap(), MIN_SQRT_PRICE);
        assert_eq!(get_sqrt_price_at_tick(MAX_TICK).unwrap(), MAX_SQRT_PRICE);
        assert!(get_sqrt_price_at_tick(MIN_TICK - 1).is_err());
        assert!(get_sqrt_price_at_tick(MAX_TICK + 1).is_err());
    }

    #[test]
    fn test_sqrt_price_is_monotonic() {
        let mut previous = get_sqrt_price_at_tick(-1_000).unwrap();
        for tick in -999..1_000 {
            let current = get_sqrt_price_at_tick(tick).unwrap();
            assert!(current > previous, "sqrt price not increasing at tick {}", tick);
            previous = current;
        }
    }

    #[test]
    fn test_sqrt_price_to_tick_conversion() {
        for tick in [MIN_TICK, -100_000, -1_000, -1, 0, 1, 1_000, 100_000, MAX_TICK] {
            let sqrt_price = get_sqrt_price_at_tick(tick).unwrap();
            assert_eq!(get_tick_at_sqrt_price(sqrt_price).unwrap(), tick);
            if tick < MAX_TICK {
                assert_eq!(get_tick_at_sqrt_price(sqrt_price + 1).unwrap(), tick);
            }
        }
    }

    #[test]
    fn test_round_tick() {
        assert_eq!(round_tick_single(5, 10), 0);
        assert_eq!(round_tick_single(10, 10), 10);
        assert_eq!(round_tick_single(-5, 10), -10);
        assert_eq!(round_tick_single(-10, 10), -10);
        assert_eq!(round_tick(-15, 10), (-20, -10));
    }

    #[test]
    fn test_usable_ticks() {
        assert_eq!(min_usable_tick(60), -887_220);
        assert_eq!(max_usable_tick(60), 887_220);
        assert_eq!(min_usable_tick(1), MIN_TICK);
        assert_eq!(max_usable_tick(1), MAX_TICK);
    }
}

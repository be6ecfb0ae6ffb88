//! # Active Balances
//!
//! Token balances an LDF implies at a price: every tick right of the current
//! one holds token0, every tick left of it token1, and the current tick is
//! split at the exact price. The inverse derives the total liquidity a pair of
//! balances supports.

use ethnum::U256;

use crate::constants::{MAX_TICK, MIN_TICK, Q96};
use crate::errors::CoreResult;
use crate::ldf::{LdfContext, LiquidityDensityFunction, ResolvedLdf};
use crate::math::big_int::{mul_div, to_u128, Rounding};
use crate::math::liquidity_math::{get_amount0_delta, get_amount1_delta};
use crate::math::tick_math::{get_sqrt_price_at_tick, round_tick_single};
use crate::types::LdfBalances;

/// Sqrt price of a tick boundary, pinned to the valid tick range
pub(crate) fn boundary_sqrt_price(tick: i32) -> CoreResult<U256> {
    get_sqrt_price_at_tick(tick.clamp(MIN_TICK, MAX_TICK))
}

/// Balances held by `total_liquidity` at `sqrt_price_x96`, rounded down
pub fn compute_balances(
    ldf: &LiquidityDensityFunction,
    context: &LdfContext,
    sqrt_price_x96: U256,
    tick: i32,
    total_liquidity: u128,
) -> CoreResult<LdfBalances> {
    balances_at(&ldf.resolve(context)?, sqrt_price_x96, tick, total_liquidity, Rounding::Down)
}

/// Balances for an already resolved LDF with an explicit rounding direction
pub fn balances_at(
    ldf: &ResolvedLdf,
    sqrt_price_x96: U256,
    tick: i32,
    total_liquidity: u128,
    rounding: Rounding,
) -> CoreResult<LdfBalances> {
    let s = ldf.tick_spacing();
    let rounded_tick = round_tick_single(tick, s);
    let query = ldf.query(rounded_tick)?;
    let round_up = rounding == Rounding::Up;

    let (partial0_x96, partial1_x96) = if query.liquidity_density_x96 == U256::ZERO {
        (U256::ZERO, U256::ZERO)
    } else {
        let density = to_u128(query.liquidity_density_x96)?;
        let lower = boundary_sqrt_price(rounded_tick)?;
        let upper = boundary_sqrt_price(rounded_tick + s)?;
        let price = sqrt_price_x96.clamp(lower, upper);
        (
            get_amount0_delta(price, upper, density, round_up)?,
            get_amount1_delta(lower, price, density, round_up)?,
        )
    };

    let density0_x96 = query.cumulative_amount0_density_x96 + partial0_x96;
    let density1_x96 = query.cumulative_amount1_density_x96 + partial1_x96;
    let liquidity = U256::new(total_liquidity);

    Ok(LdfBalances {
        balance0: mul_div(density0_x96, liquidity, Q96, rounding)?,
        balance1: mul_div(density1_x96, liquidity, Q96, rounding)?,
        density0_x96,
        density1_x96,
    })
}

/// Total liquidity supported by token balances
///
/// The minimum over the tokens the LDF holds at the current price, so neither
/// balance is overdrawn. Zero when the LDF holds neither token.
pub fn total_liquidity_from_balances(
    balance0: U256,
    balance1: U256,
    density0_x96: U256,
    density1_x96: U256,
) -> CoreResult<u128> {
    let mut liquidity: Option<U256> = None;
    for (balance, density) in [(balance0, density0_x96), (balance1, density1_x96)] {
        if density == U256::ZERO {
            continue;
        }
        let implied = mul_div(balance, Q96, density, Rounding::Down)?;
        liquidity = Some(liquidity.map_or(implied, |current| current.min(implied)));
    }
    Ok(liquidity.map_or(0, |value| to_u128(value).unwrap_or(u128::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{geometric, uniform};
    use crate::types::{LdfKind, LdfState, ShiftMode};

    const LIQUIDITY: u128 = 1_000_000_000_000_000_000_000;

    fn context() -> LdfContext {
        LdfContext {
            tick_spacing: 60,
            reference_tick: 0,
            state: LdfState::default(),
        }
    }

    fn uniform_ldf() -> LiquidityDensityFunction {
        LiquidityDensityFunction::new(LdfKind::Uniform, uniform::encode_params(ShiftMode::Static, -600, 600))
    }

    #[test]
    fn test_balances_at_range_edges() {
        let ldf = uniform_ldf();
        let below = compute_balances(&ldf, &context(), get_sqrt_price_at_tick(-600).unwrap(), -600, LIQUIDITY)
            .unwrap();
        assert_eq!(below.balance1, U256::ZERO);
        assert!(below.balance0 > U256::ZERO);

        let above = compute_balances(&ldf, &context(), get_sqrt_price_at_tick(600).unwrap(), 600, LIQUIDITY)
            .unwrap();
        assert_eq!(above.balance0, U256::ZERO);
        assert!(above.balance1 > U256::ZERO);
    }

    #[test]
    fn test_balances_split_inside_a_tick() {
        let ldf = uniform_ldf();
        let lower = get_sqrt_price_at_tick(0).unwrap();
        let upper = get_sqrt_price_at_tick(60).unwrap();
        let middle = (lower + upper) / 2;

        let at_lower = compute_balances(&ldf, &context(), lower, 0, LIQUIDITY).unwrap();
        let at_middle = compute_balances(&ldf, &context(), middle, 0, LIQUIDITY).unwrap();
        let at_upper = compute_balances(&ldf, &context(), upper, 60, LIQUIDITY).unwrap();

        assert!(at_lower.balance0 > at_middle.balance0 && at_middle.balance0 > at_upper.balance0);
        assert!(at_lower.balance1 < at_middle.balance1 && at_middle.balance1 < at_upper.balance1);
    }

    #[test]
    fn test_rounding_up_never_undercounts() {
        let ldf = uniform_ldf().resolve(&context()).unwrap();
        let price = get_sqrt_price_at_tick(17).unwrap();
        let down = balances_at(&ldf, price, 17, LIQUIDITY, Rounding::Down).unwrap();
        let up = balances_at(&ldf, price, 17, LIQUIDITY, Rounding::Up).unwrap();
        assert!(up.balance0 >= down.balance0);
        assert!(up.balance1 >= down.balance1);
    }

    #[test]
    fn test_total_liquidity_round_trip() {
        let ldf = LiquidityDensityFunction::new(
            LdfKind::Geometric,
            geometric::encode_params(ShiftMode::Static, -600, 20, 90_000_000),
        );
        let price = get_sqrt_price_at_tick(-90).unwrap();
        let balances = compute_balances(&ldf, &context(), price, -90, LIQUIDITY).unwrap();
        let implied = total_liquidity_from_balances(
            balances.balance0,
            balances.balance1,
            balances.density0_x96,
            balances.density1_x96,
        )
        .unwrap();
        assert!(implied <= LIQUIDITY);
        assert!(LIQUIDITY - implied < LIQUIDITY / 1_000_000_000);

        // a surplus of one token is left idle
        let lopsided = total_liquidity_from_balances(
            balances.balance0,
            balances.balance1 * U256::new(2),
            balances.density0_x96,
            balances.density1_x96,
        )
        .unwrap();
        assert!(lopsided >= implied);
        assert!(lopsided <= LIQUIDITY);
    }

    #[test]
    fn test_total_liquidity_without_holdings() {
        assert_eq!(
            total_liquidity_from_balances(U256::new(5), U256::new(7), U256::ZERO, U256::ZERO).unwrap(),
            0
        );
        let only0 = total_liquidity_from_balances(U256::new(10), U256::ZERO, Q96 / 2, U256::ZERO).unwrap();
        assert_eq!(only0, 20);
    }
}

//! # Swap Math
//!
//! A trade first tries to settle inside the current rounded tick with a
//! constant-liquidity step. When it runs past the tick boundary, the LDF is
//! asked where the pool's token balances reach their post-trade value and the
//! remaining partial step is taken inside that tick.
//!
//! Amounts of a trade that crosses ticks are the difference of LDF balances
//! before and after it, rounded against the trader: input up, output down.

use ethnum::U256;
use tracing::{debug, trace};

use crate::constants::{MAX_SQRT_PRICE, MIN_SQRT_PRICE, Q96};
use crate::errors::{CoreResult, LdfCoreError};
use crate::ldf::{LdfContext, ResolvedLdf};
use crate::math::big_int::{mul_div, to_u128, Rounding};
use crate::math::liquidity_math::{compute_swap_step, get_next_sqrt_price_from_input};
use crate::math::tick_math::{
    get_tick_at_sqrt_price, is_sqrt_price_valid, is_tick_spacing_valid, round_tick_single,
};
use crate::swap::balances::{balances_at, boundary_sqrt_price};
use crate::types::{LdfBalances, SwapInput, SwapOutput};

/// Execute a swap against the LDF
pub fn compute_swap(input: &SwapInput) -> CoreResult<SwapOutput> {
    validate_input(input)?;

    let context = LdfContext {
        tick_spacing: input.tick_spacing,
        reference_tick: input.reference_tick,
        state: input.ldf_state,
    };
    let ldf = input.ldf.resolve(&context)?;

    if let Some(output) = swap_within_tick(input, &ldf)? {
        trace!(tick = output.tick, "swap settled inside the current tick");
        return Ok(output);
    }
    swap_across_ticks(input, &ldf)
}

fn validate_input(input: &SwapInput) -> CoreResult<()> {
    if input.amount_specified == U256::ZERO {
        return Err(LdfCoreError::ZeroAmount);
    }
    if !is_tick_spacing_valid(input.tick_spacing) {
        return Err(LdfCoreError::InvalidTickSpacing(input.tick_spacing));
    }
    if !is_sqrt_price_valid(input.sqrt_price_x96) {
        return Err(LdfCoreError::InvalidSqrtPrice);
    }

    let limit = input.sqrt_price_limit_x96;
    let valid_limit = if input.zero_for_one {
        limit < input.sqrt_price_x96 && limit >= MIN_SQRT_PRICE
    } else {
        limit > input.sqrt_price_x96 && limit <= MAX_SQRT_PRICE
    };
    if !valid_limit {
        return Err(LdfCoreError::InvalidPriceLimit);
    }
    Ok(())
}

/// Constant-liquidity step toward the current tick's boundary
///
/// `None` when the trade reaches the boundary with amount left over.
fn swap_within_tick(input: &SwapInput, ldf: &ResolvedLdf) -> CoreResult<Option<SwapOutput>> {
    let s = input.tick_spacing;
    let current = input.sqrt_price_x96;
    let limit = input.sqrt_price_limit_x96;
    let amount = input.amount_specified;

    let rounded_tick = round_tick_single(input.tick, s);
    let density = ldf.liquidity_density_x96(rounded_tick)?;
    let liquidity = to_u128(mul_div(density, U256::new(input.total_liquidity), Q96, Rounding::Down)?)?;

    let (boundary, target) = if input.zero_for_one {
        let boundary = boundary_sqrt_price(rounded_tick)?;
        (boundary, boundary.max(limit).min(current))
    } else {
        let boundary = boundary_sqrt_price(rounded_tick + s)?;
        (boundary, boundary.min(limit).max(current))
    };

    let step = compute_swap_step(current, target, liquidity, amount, input.exact_in)?;
    let next = step.sqrt_price_next_x96;
    let consumed = if input.exact_in {
        step.amount_in >= amount
    } else {
        step.amount_out >= amount
    };

    if next != boundary || next == limit || consumed {
        let stopped_inside = next != target;
        let amount_in = if input.exact_in && stopped_inside {
            amount
        } else {
            step.amount_in
        };
        return Ok(Some(SwapOutput {
            sqrt_price_x96: next,
            tick: get_tick_at_sqrt_price(next)?,
            amount_in,
            amount_out: step.amount_out,
            ldf_state: ldf.new_state(),
            should_surge: ldf.should_surge(),
        }));
    }
    Ok(None)
}

fn swap_across_ticks(input: &SwapInput, ldf: &ResolvedLdf) -> CoreResult<SwapOutput> {
    let zero_for_one = input.zero_for_one;
    let exact_in = input.exact_in;
    let current = input.sqrt_price_x96;
    let total_liquidity = input.total_liquidity;

    let start = balances_at(ldf, current, input.tick, total_liquidity, Rounding::Down)?;
    let (balance_in, balance_out) = in_and_out(&start, zero_for_one);

    let mut amount = input.amount_specified;
    if !exact_in && amount > balance_out {
        debug!(
            requested = %amount,
            available = %balance_out,
            "clamping exact output to the active balance"
        );
        amount = balance_out;
    }
    if amount == U256::ZERO {
        debug!(tick = input.tick, zero_for_one, "no output token held past the current price");
        return Ok(SwapOutput {
            sqrt_price_x96: current,
            tick: input.tick,
            amount_in: U256::ZERO,
            amount_out: U256::ZERO,
            ldf_state: ldf.new_state(),
            should_surge: ldf.should_surge(),
        });
    }

    // Balance of the inverted token once the trade is done
    let target = if exact_in {
        balance_in
            .checked_add(amount)
            .ok_or(LdfCoreError::MathOverflow)?
    } else {
        balance_out - amount
    };

    let swap = ldf.compute_swap(target, total_liquidity, zero_for_one, exact_in)?;
    let settlement = if swap.success {
        settle_in_tick(input, ldf, swap.rounded_tick, target, amount, balance_in, balance_out)?
    } else {
        let (domain_start, domain_end) = ldf.domain();
        let edge = if zero_for_one {
            boundary_sqrt_price(domain_start)?.min(current)
        } else {
            boundary_sqrt_price(domain_end)?.max(current)
        };
        debug!(edge = %edge, "no tick reaches the target balance, pricing at the domain edge");
        let settlement = Settlement::at(ldf, bound_by_limit(input, edge), total_liquidity, false)?;
        let (end_in, _) = in_and_out(&settlement.end, zero_for_one);
        if exact_in && end_in.saturating_sub(balance_in) > amount {
            // the edge holds more than the input pays for
            Settlement::at(ldf, current, total_liquidity, false)?
        } else {
            settlement
        }
    };

    let sqrt_price_x96 = settlement.sqrt_price_x96;
    if moves_against(input, sqrt_price_x96) {
        return Err(LdfCoreError::PriceMovedAgainstDirection);
    }

    let (end_in, end_out) = in_and_out(&settlement.end, zero_for_one);
    let (amount_in, amount_out) = match (settlement.filled, exact_in) {
        (true, true) => (amount, balance_out.saturating_sub(end_out)),
        (true, false) => (end_in.saturating_sub(balance_in), amount),
        (false, true) => (
            end_in.saturating_sub(balance_in).min(amount),
            balance_out.saturating_sub(end_out),
        ),
        (false, false) => (
            end_in.saturating_sub(balance_in),
            balance_out.saturating_sub(end_out),
        ),
    };
    trace!(
        tick = settlement.tick,
        filled = settlement.filled,
        amount_in = %amount_in,
        amount_out = %amount_out,
        "swap crossed ticks"
    );

    Ok(SwapOutput {
        sqrt_price_x96,
        tick: settlement.tick,
        amount_in,
        amount_out: amount_out.min(balance_out),
        ldf_state: ldf.new_state(),
        should_surge: ldf.should_surge(),
    })
}

/// Where a trade crossing ticks stops
struct Settlement {
    sqrt_price_x96: U256,
    tick: i32,
    /// Balances at the final price, rounded up
    end: LdfBalances,
    /// The requested amount is met exactly at this price
    filled: bool,
}

impl Settlement {
    fn at(
        ldf: &ResolvedLdf,
        sqrt_price_x96: U256,
        total_liquidity: u128,
        filled: bool,
    ) -> CoreResult<Self> {
        let tick = get_tick_at_sqrt_price(sqrt_price_x96)?;
        Ok(Self {
            sqrt_price_x96,
            tick,
            end: balances_at(ldf, sqrt_price_x96, tick, total_liquidity, Rounding::Up)?,
            filled,
        })
    }
}

fn in_and_out(balances: &LdfBalances, zero_for_one: bool) -> (U256, U256) {
    if zero_for_one {
        (balances.balance0, balances.balance1)
    } else {
        (balances.balance1, balances.balance0)
    }
}

fn moves_against(input: &SwapInput, sqrt_price_x96: U256) -> bool {
    if input.zero_for_one {
        sqrt_price_x96 > input.sqrt_price_x96
    } else {
        sqrt_price_x96 < input.sqrt_price_x96
    }
}

fn bound_by_limit(input: &SwapInput, sqrt_price_x96: U256) -> U256 {
    if input.zero_for_one {
        sqrt_price_x96.max(input.sqrt_price_limit_x96)
    } else {
        sqrt_price_x96.min(input.sqrt_price_limit_x96)
    }
}

/// Settle a trade whose target balance the LDF located in `rounded_tick`
///
/// The price solved inside the tick is accepted only if the balances there
/// honour the requested amount: an input never buys past what it pays for,
/// an output is always fully covered. Otherwise the trade falls back to the
/// boundary the partial step started from (exact in) or ran to (exact out)
/// and is charged from balances. A tick on the wrong side of the current
/// price means the target is already met where the trade starts.
fn settle_in_tick(
    input: &SwapInput,
    ldf: &ResolvedLdf,
    rounded_tick: i32,
    target: U256,
    amount: U256,
    balance_in: U256,
    balance_out: U256,
) -> CoreResult<Settlement> {
    let zero_for_one = input.zero_for_one;
    let current = input.sqrt_price_x96;
    let total_liquidity = input.total_liquidity;

    let lower = boundary_sqrt_price(rounded_tick)?;
    let upper = boundary_sqrt_price(rounded_tick + ldf.tick_spacing())?;
    let (step_start, step_end) = if zero_for_one {
        (upper, lower)
    } else {
        (lower, upper)
    };
    let solved = price_in_tick(
        ldf,
        rounded_tick,
        target,
        total_liquidity,
        zero_for_one,
        input.exact_in,
    )?;
    let fallback = if input.exact_in { step_start } else { step_end };

    for candidate in [solved, fallback] {
        if moves_against(input, candidate) {
            continue;
        }

        let bounded = bound_by_limit(input, candidate);
        if bounded != candidate {
            return Settlement::at(ldf, bounded, total_liquidity, false);
        }
        let settlement = Settlement::at(ldf, candidate, total_liquidity, true)?;
        let (end_in, end_out) = in_and_out(&settlement.end, zero_for_one);
        let honoured = if input.exact_in {
            end_in.saturating_sub(balance_in) <= amount
        } else {
            balance_out.saturating_sub(end_out) >= amount
        };
        if honoured {
            return Ok(settlement);
        }
        trace!(candidate = %candidate, "rounding missed the target balance");
    }

    let settle_price = if input.exact_in || moves_against(input, step_end) {
        current
    } else {
        bound_by_limit(input, step_end)
    };
    debug!(
        rounded_tick,
        settle_price = %settle_price,
        "settling without meeting the requested amount"
    );
    Settlement::at(ldf, settle_price, total_liquidity, false)
}

/// Price inside `rounded_tick` where the inverted token's balance reaches `target`
///
/// Solved in density space from the boundary where the tick holds none of the
/// inverted token, with the same rounding the balances use, so the balance at
/// the returned price never exceeds `target`.
fn price_in_tick(
    ldf: &ResolvedLdf,
    rounded_tick: i32,
    target: U256,
    total_liquidity: u128,
    zero_for_one: bool,
    exact_in: bool,
) -> CoreResult<U256> {
    let lower = boundary_sqrt_price(rounded_tick)?;
    let upper = boundary_sqrt_price(rounded_tick + ldf.tick_spacing())?;
    let query = ldf.query(rounded_tick)?;
    if query.liquidity_density_x96 == U256::ZERO || total_liquidity == 0 {
        return Ok(if zero_for_one { upper } else { lower });
    }

    // Token0 sits above the price, token1 below it
    let token0 = exact_in == zero_for_one;
    let (empty_side, full_side, held) = if token0 {
        (upper, lower, query.cumulative_amount0_density_x96)
    } else {
        (lower, upper, query.cumulative_amount1_density_x96)
    };
    let density = to_u128(query.liquidity_density_x96)?;
    let target_density = mul_div(target, Q96, U256::new(total_liquidity), Rounding::Down)?;
    let partial = target_density.saturating_sub(held);

    let price = match get_next_sqrt_price_from_input(empty_side, density, partial, token0) {
        Ok(price) => price,
        // More than the tick holds: its whole range is needed
        Err(LdfCoreError::MathUnderflow | LdfCoreError::MathOverflow) => full_side,
        Err(e) => return Err(e),
    };
    Ok(price.clamp(lower, upper))
}

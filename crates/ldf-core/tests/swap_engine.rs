//! Swap engine integration tests
//!
//! Trades against every distribution family, checking that amounts stay
//! within the pool's active balances, prices move with the trade direction
//! and round trips never pay out more than was put in.

mod common;

use common::test_constants::*;
use common::*;
use ethnum::U256;
use ldf_core::math::get_sqrt_price_at_tick;
use ldf_core::{
    compute_balances, compute_swap, LdfBalances, LdfCoreError, LdfState, LiquidityDensityFunction,
    ShiftMode, SwapInput, SwapOutput,
};
use proptest::prelude::*;
use static_assertions::assert_impl_all;

assert_impl_all!(SwapInput: Send, Sync, Copy);
assert_impl_all!(SwapOutput: Send, Sync, Copy);
assert_impl_all!(LiquidityDensityFunction: Send, Sync, Copy);
assert_impl_all!(LdfCoreError: Send, Sync, std::error::Error);

fn balances_before(input: &SwapInput) -> LdfBalances {
    let context = ldf_core::LdfContext {
        tick_spacing: input.tick_spacing,
        reference_tick: input.reference_tick,
        state: input.ldf_state,
    };
    compute_balances(
        &input.ldf,
        &context,
        input.sqrt_price_x96,
        input.tick,
        input.total_liquidity,
    )
    .unwrap()
}

/// Exact-input swap in the opposite direction from where `output` left the pool
fn reverse_of(input: &SwapInput, output: &SwapOutput) -> SwapInput {
    SwapInput {
        tick: output.tick,
        sqrt_price_x96: output.sqrt_price_x96,
        zero_for_one: !input.zero_for_one,
        amount_specified: output.amount_out,
        sqrt_price_limit_x96: if input.zero_for_one {
            ldf_core::MAX_SQRT_PRICE
        } else {
            ldf_core::MIN_SQRT_PRICE
        },
        ldf_state: output.ldf_state,
        ..*input
    }
}

fn assert_swap_sane(input: &SwapInput, output: &SwapOutput, label: &str) {
    let balances = balances_before(input);
    let balance_out = if input.zero_for_one {
        balances.balance1
    } else {
        balances.balance0
    };

    assert!(output.amount_out <= balance_out, "{}: paid out more than the pool holds", label);
    if input.exact_in {
        assert!(output.amount_in <= input.amount_specified, "{}: took more than offered", label);
    } else {
        assert!(output.amount_out <= input.amount_specified, "{}: paid more than asked", label);
    }
    if input.zero_for_one {
        assert!(output.sqrt_price_x96 <= input.sqrt_price_x96, "{}: price rose", label);
        assert!(output.tick <= input.tick);
    } else {
        assert!(output.sqrt_price_x96 >= input.sqrt_price_x96, "{}: price fell", label);
        assert!(output.tick >= input.tick);
    }
}

#[test]
fn test_swaps_against_every_family() {
    init_test_tracing();

    for pool in static_pools() {
        for zero_for_one in [true, false] {
            for amount in [SMALL_SWAP_AMOUNT, LARGE_SWAP_AMOUNT] {
                let input = pool.swap_input(zero_for_one, amount);
                let output = compute_swap(&input)
                    .unwrap_or_else(|e| panic!("{} swap failed: {}", pool.name, e));
                let label = format!("{} zfo={} amount={}", pool.name, zero_for_one, amount);

                assert_swap_sane(&input, &output, &label);
                assert!(output.amount_out > U256::ZERO, "{}: nothing out", label);
                // no fees and a price near 1: out never exceeds in by more than the price gap
                assert!(output.amount_out < output.amount_in * U256::new(2), "{}", label);
                assert!(!output.should_surge);
            }
        }
    }
}

/// A reverse exact-in swap of the output never pays back more than went in
fn assert_round_trip_conserves(input: &SwapInput, output: &SwapOutput, label: &str) {
    if output.amount_out == U256::ZERO {
        return;
    }
    let back = compute_swap(&reverse_of(input, output))
        .unwrap_or_else(|e| panic!("{}: reverse swap failed: {}", label, e));
    assert!(
        back.amount_out <= output.amount_in,
        "{}: put in {}, recovered {}",
        label,
        output.amount_in,
        back.amount_out
    );
}

#[test]
fn test_reverse_swap_recovers_at_most_the_input() {
    init_test_tracing();

    for pool in static_pools() {
        for zero_for_one in [true, false] {
            for amount in [SMALL_SWAP_AMOUNT, LARGE_SWAP_AMOUNT, LARGE_SWAP_AMOUNT * 7] {
                let input = pool.swap_input(zero_for_one, amount);
                let output = compute_swap(&input).unwrap();
                let label = format!("{} zfo={} amount={}", pool.name, zero_for_one, amount);
                assert_round_trip_conserves(&input, &output, &label);
            }
        }
    }
}

#[test]
fn test_carpeted_round_trip_after_crossing_the_core() {
    let pool = static_pools()[5];
    let cases = [
        (-283, 7_000_000_000_000_000_000u128),
        (182, 69_252_001_100_000_000_001),
    ];
    for (tick, amount) in cases {
        for zero_for_one in [true, false] {
            let input = pool.swap_at(tick, TICK_SPACING, zero_for_one, true, amount);
            let output = compute_swap(&input).unwrap();
            assert!(output.amount_in <= input.amount_specified);
            let label = format!("carpeted tick={} zfo={}", tick, zero_for_one);
            assert_round_trip_conserves(&input, &output, &label);
        }
    }
}

#[test]
fn test_swaps_from_tick_boundaries() {
    for pool in static_pools() {
        for tick in [pool.tick, pool.tick - TICK_SPACING, pool.tick + TICK_SPACING] {
            for zero_for_one in [true, false] {
                for exact_in in [true, false] {
                    let amount = LARGE_SWAP_AMOUNT / 10;
                    let input = pool.swap_at(tick, TICK_SPACING, zero_for_one, exact_in, amount);
                    let label = format!(
                        "{} tick={} zfo={} exact_in={}",
                        pool.name, tick, zero_for_one, exact_in
                    );
                    let output =
                        compute_swap(&input).unwrap_or_else(|e| panic!("{}: {}", label, e));

                    assert_swap_sane(&input, &output, &label);
                    if exact_in {
                        assert_round_trip_conserves(&input, &output, &label);
                    } else {
                        assert!(output.amount_out <= input.amount_specified, "{}", label);
                    }
                }
            }
        }
    }
}

#[test]
fn test_exact_output_beyond_the_domain_is_a_no_op() {
    init_test_tracing();

    for pool in static_pools() {
        let (start, end) = pool.ldf.domain(&pool.context()).unwrap();
        if end > 100_000 || start < -100_000 {
            // spans the usable range, nothing lies outside it
            continue;
        }

        // no token0 above the domain, no token1 below it
        for (tick, zero_for_one) in [(end + 105, false), (start - 105, true)] {
            let amount = 914_051_843_000_000_001;
            let input = pool.swap_at(tick, TICK_SPACING, zero_for_one, false, amount);
            let output = compute_swap(&input)
                .unwrap_or_else(|e| panic!("{} tick={}: {}", pool.name, tick, e));
            assert_eq!(output.amount_out, U256::ZERO, "{}", pool.name);
            assert_eq!(output.amount_in, U256::ZERO, "{}", pool.name);
            assert_eq!(output.sqrt_price_x96, input.sqrt_price_x96, "{}", pool.name);
            assert_eq!(output.tick, tick);
        }

        // trading back toward the domain fills from its edge
        for (tick, zero_for_one) in [(end + 105, true), (start - 105, false)] {
            let amount = LARGE_SWAP_AMOUNT / 10;
            let input = pool.swap_at(tick, TICK_SPACING, zero_for_one, false, amount);
            let output = compute_swap(&input).unwrap();
            assert_eq!(output.amount_out, input.amount_specified, "{} tick={}", pool.name, tick);
            assert_swap_sane(&input, &output, pool.name);
        }
    }
}

#[test]
fn test_small_swaps_settle_inside_the_tick() {
    for pool in static_pools() {
        let input = pool.swap_input(false, SMALL_SWAP_AMOUNT);
        let output = compute_swap(&input).unwrap();
        assert_eq!(output.amount_in, input.amount_specified, "{}", pool.name);
        assert_eq!(output.tick.div_euclid(TICK_SPACING), input.tick.div_euclid(TICK_SPACING));
    }
}

#[test]
fn test_exact_output_swaps() {
    for pool in static_pools() {
        let mut input = pool.swap_input(true, LARGE_SWAP_AMOUNT / 10);
        input.exact_in = false;
        let output = compute_swap(&input).unwrap();
        assert_eq!(output.amount_out, input.amount_specified, "{}", pool.name);
        assert!(output.amount_in >= output.amount_out / U256::new(2));
        assert!(output.sqrt_price_x96 < input.sqrt_price_x96);
    }
}

#[test]
fn test_price_limit_is_respected() {
    for pool in static_pools() {
        let mut input = pool.swap_input(true, LARGE_SWAP_AMOUNT * 1_000);
        input.sqrt_price_limit_x96 = get_sqrt_price_at_tick(pool.tick - 120).unwrap();
        let output = compute_swap(&input).unwrap();
        assert!(output.sqrt_price_x96 >= input.sqrt_price_limit_x96, "{}", pool.name);
        assert!(output.amount_in < input.amount_specified, "{}", pool.name);
    }
}

#[test]
fn test_invalid_swaps_are_rejected() {
    let pool = static_pools()[0];

    let mut input = pool.swap_input(true, SMALL_SWAP_AMOUNT);
    input.amount_specified = U256::ZERO;
    assert_eq!(compute_swap(&input), Err(LdfCoreError::ZeroAmount));

    let mut input = pool.swap_input(true, SMALL_SWAP_AMOUNT);
    input.sqrt_price_limit_x96 = ldf_core::MAX_SQRT_PRICE;
    assert_eq!(compute_swap(&input), Err(LdfCoreError::InvalidPriceLimit));

    let mut input = pool.swap_input(false, SMALL_SWAP_AMOUNT);
    input.tick_spacing = 0;
    assert_eq!(compute_swap(&input), Err(LdfCoreError::InvalidTickSpacing(0)));

    let mut input = pool.swap_input(false, SMALL_SWAP_AMOUNT);
    input.sqrt_price_x96 = U256::ONE;
    input.sqrt_price_limit_x96 = U256::new(2);
    assert_eq!(compute_swap(&input), Err(LdfCoreError::InvalidSqrtPrice));
}

#[test]
fn test_state_threads_through_swaps() {
    init_test_tracing();

    let ldf = dynamic_uniform(ShiftMode::Both, -300, 10);
    let first = SwapInput {
        tick_spacing: TICK_SPACING,
        tick: 17,
        sqrt_price_x96: get_sqrt_price_at_tick(17).unwrap(),
        total_liquidity: TOTAL_LIQUIDITY,
        zero_for_one: false,
        exact_in: true,
        amount_specified: U256::new(SMALL_SWAP_AMOUNT),
        sqrt_price_limit_x96: ldf_core::MAX_SQRT_PRICE,
        reference_tick: 0,
        ldf,
        ldf_state: LdfState::default(),
    };
    let output = compute_swap(&first).unwrap();
    assert_eq!(output.ldf_state, LdfState::with_anchor(-300));
    assert!(!output.should_surge);

    // the reference moved a full range to the right: the shape follows and surges
    let second = SwapInput {
        tick: 617,
        sqrt_price_x96: get_sqrt_price_at_tick(617).unwrap(),
        reference_tick: 600,
        ldf_state: output.ldf_state,
        ..first
    };
    let output = compute_swap(&second).unwrap();
    assert_eq!(output.ldf_state, LdfState::with_anchor(300));
    assert!(output.should_surge);

    // same reference again: nothing moves
    let third = SwapInput {
        ldf_state: output.ldf_state,
        ..second
    };
    let output = compute_swap(&third).unwrap();
    assert_eq!(output.ldf_state, LdfState::with_anchor(300));
    assert!(!output.should_surge);
}

#[test]
fn test_left_shift_mode_holds_against_rising_reference() {
    let ldf = dynamic_uniform(ShiftMode::Left, -300, 10);
    let input = SwapInput {
        tick_spacing: TICK_SPACING,
        tick: 17,
        sqrt_price_x96: get_sqrt_price_at_tick(17).unwrap(),
        total_liquidity: TOTAL_LIQUIDITY,
        zero_for_one: true,
        exact_in: true,
        amount_specified: U256::new(SMALL_SWAP_AMOUNT),
        sqrt_price_limit_x96: ldf_core::MIN_SQRT_PRICE,
        reference_tick: 600,
        ldf,
        ldf_state: LdfState::with_anchor(-300),
    };
    let output = compute_swap(&input).unwrap();
    assert_eq!(output.ldf_state, LdfState::with_anchor(-300));
    assert!(!output.should_surge);
}

prop_compose! {
    fn swap_strategy()(
        pool_index in 0usize..6usize,
        offset in -750i32..=750i32,
        tick_spacing in prop_oneof![Just(1i32), Just(10i32), Just(60i32)],
        zero_for_one in any::<bool>(),
        exact_in in any::<bool>(),
        amount in 1_000_000_000u128..100_000_000_000_000_000_000u128,
    ) -> (PoolFixture, SwapInput) {
        let pool = static_pools()[pool_index];
        let input = pool.swap_at(pool.tick + offset, tick_spacing, zero_for_one, exact_in, amount);
        (pool, input)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_swaps_stay_within_balances((pool, input) in swap_strategy()) {
        prop_assume!(pool.ldf.is_valid_params(input.tick_spacing, 0));
        let output = compute_swap(&input).unwrap();
        let balances = balances_before(&input);
        let balance_out = if input.zero_for_one { balances.balance1 } else { balances.balance0 };

        prop_assert!(output.amount_out <= balance_out);
        if input.exact_in {
            prop_assert!(output.amount_in <= input.amount_specified);
        } else {
            prop_assert!(output.amount_out <= input.amount_specified);
        }
        if input.zero_for_one {
            prop_assert!(output.sqrt_price_x96 <= input.sqrt_price_x96);
        } else {
            prop_assert!(output.sqrt_price_x96 >= input.sqrt_price_x96);
        }
    }

    #[test]
    fn prop_round_trips_never_create_value((pool, input) in swap_strategy()) {
        prop_assume!(pool.ldf.is_valid_params(input.tick_spacing, 0));
        let input = SwapInput { exact_in: true, ..input };
        let output = compute_swap(&input).unwrap();
        prop_assume!(output.amount_out > U256::ZERO);

        let back = compute_swap(&reverse_of(&input, &output)).unwrap();
        prop_assert!(
            back.amount_out <= output.amount_in,
            "put in {}, recovered {}",
            output.amount_in,
            back.amount_out
        );
    }
}

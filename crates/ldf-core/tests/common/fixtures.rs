//! Pool fixtures covering every distribution family

use ethnum::U256;
use ldf_core::distributions::{
    carpeted_geometric, discrete_laplace, double_geometric, geometric, uniform,
};
use ldf_core::math::get_sqrt_price_at_tick;
use ldf_core::{LdfContext, LdfKind, LdfState, LiquidityDensityFunction, ShiftMode, SwapInput};

pub mod test_constants {
    pub const TICK_SPACING: i32 = 60;
    pub const TOTAL_LIQUIDITY: u128 = 1_000_000_000_000_000_000_000;
    pub const SMALL_SWAP_AMOUNT: u128 = 1_000_000_000_000_000;
    pub const LARGE_SWAP_AMOUNT: u128 = 1_000_000_000_000_000_000;
    pub const TWAP_SECONDS_AGO: u32 = 1_800;
}

use test_constants::*;

/// A static LDF and a tick with liquidity on both sides of it
#[derive(Debug, Clone, Copy)]
pub struct PoolFixture {
    pub name: &'static str,
    pub ldf: LiquidityDensityFunction,
    pub tick: i32,
}

impl PoolFixture {
    pub fn context(&self) -> LdfContext {
        LdfContext {
            tick_spacing: TICK_SPACING,
            reference_tick: self.tick,
            state: LdfState::default(),
        }
    }

    /// Exact-input swap from a price inside the fixture tick
    pub fn swap_input(&self, zero_for_one: bool, amount: u128) -> SwapInput {
        self.swap_at(self.tick + 17, TICK_SPACING, zero_for_one, true, amount)
    }

    /// Swap starting exactly at `tick`, unbounded by a price limit
    pub fn swap_at(
        &self,
        tick: i32,
        tick_spacing: i32,
        zero_for_one: bool,
        exact_in: bool,
        amount: u128,
    ) -> SwapInput {
        SwapInput {
            tick_spacing,
            tick,
            sqrt_price_x96: get_sqrt_price_at_tick(tick).unwrap(),
            total_liquidity: TOTAL_LIQUIDITY,
            zero_for_one,
            exact_in,
            amount_specified: U256::new(amount),
            sqrt_price_limit_x96: if zero_for_one {
                ldf_core::MIN_SQRT_PRICE
            } else {
                ldf_core::MAX_SQRT_PRICE
            },
            reference_tick: self.tick,
            ldf: self.ldf,
            ldf_state: LdfState::default(),
        }
    }
}

pub fn static_pools() -> Vec<PoolFixture> {
    vec![
        PoolFixture {
            name: "uniform",
            ldf: LiquidityDensityFunction::new(
                LdfKind::Uniform,
                uniform::encode_params(ShiftMode::Static, -600, 600),
            ),
            tick: 0,
        },
        PoolFixture {
            name: "geometric",
            ldf: LiquidityDensityFunction::new(
                LdfKind::Geometric,
                geometric::encode_params(ShiftMode::Static, -600, 20, 90_000_000),
            ),
            tick: 0,
        },
        PoolFixture {
            name: "geometric_rising",
            ldf: LiquidityDensityFunction::new(
                LdfKind::Geometric,
                geometric::encode_params(ShiftMode::Static, -600, 20, 110_000_000),
            ),
            tick: 0,
        },
        PoolFixture {
            name: "double_geometric",
            ldf: LiquidityDensityFunction::new(
                LdfKind::DoubleGeometric,
                double_geometric::encode_params(
                    ShiftMode::Static,
                    -1_200,
                    (10, 80_000_000, 1),
                    (10, 125_000_000, 1),
                ),
            ),
            tick: -600,
        },
        PoolFixture {
            name: "discrete_laplace",
            ldf: LiquidityDensityFunction::new(
                LdfKind::DiscreteLaplace,
                discrete_laplace::encode_params(ShiftMode::Static, 0, 50_000_000),
            ),
            tick: 0,
        },
        PoolFixture {
            name: "carpeted_geometric",
            ldf: LiquidityDensityFunction::new(
                LdfKind::CarpetedGeometric,
                carpeted_geometric::encode_params(
                    ShiftMode::Static,
                    -600,
                    10,
                    90_000_000,
                    10_000_000,
                ),
            ),
            tick: -300,
        },
    ]
}

/// Uniform range of `length` rounded ticks starting `offset` ticks from the reference
pub fn dynamic_uniform(shift_mode: ShiftMode, offset: i32, length: i32) -> LiquidityDensityFunction {
    LiquidityDensityFunction::new(
        LdfKind::Uniform,
        uniform::encode_params(shift_mode, offset, length),
    )
}

//! # LDF Facade
//!
//! A pool's liquidity density function is a family tag plus a packed parameter
//! record. Every evaluation decodes the record against the reference tick,
//! resolves the anchor against the persisted state and then dispatches to the
//! family through [`Distribution`].
//!
//! [`ResolvedLdf`] holds the outcome of that first step so a caller running
//! several evaluations at one reference tick (the swap engine) decodes once.

use ethnum::U256;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::constants::Q96;
use crate::distributions::{
    carpeted_geometric, discrete_laplace, double_geometric, geometric, uniform,
    CarpetedGeometricParams, DiscreteLaplaceParams, Distribution, DoubleGeometricParams,
    GeometricParams, UniformParams,
};
use crate::errors::CoreResult;
use crate::ldf::shift::{resolve_anchor, AnchorResolution};
use crate::math::big_int::{mul_div, to_u128, Rounding};
use crate::types::{LdfKind, LdfParams, LdfQuery, LdfState, LdfSwap, ShiftMode};

/// Decoded parameters of any family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedParams {
    Uniform(UniformParams),
    Geometric(GeometricParams),
    DoubleGeometric(DoubleGeometricParams),
    DiscreteLaplace(DiscreteLaplaceParams),
    CarpetedGeometric(CarpetedGeometricParams),
}

impl DecodedParams {
    pub fn kind(&self) -> LdfKind {
        match self {
            DecodedParams::Uniform(_) => LdfKind::Uniform,
            DecodedParams::Geometric(_) => LdfKind::Geometric,
            DecodedParams::DoubleGeometric(_) => LdfKind::DoubleGeometric,
            DecodedParams::DiscreteLaplace(_) => LdfKind::DiscreteLaplace,
            DecodedParams::CarpetedGeometric(_) => LdfKind::CarpetedGeometric,
        }
    }

    pub fn shift_mode(&self) -> ShiftMode {
        match self {
            DecodedParams::Uniform(p) => p.shift_mode,
            DecodedParams::Geometric(p) => p.shift_mode,
            DecodedParams::DoubleGeometric(p) => p.shift_mode,
            DecodedParams::DiscreteLaplace(p) => p.shift_mode,
            DecodedParams::CarpetedGeometric(p) => p.shift_mode,
        }
    }

    /// Tick the shape is positioned by: `mu` for Laplace, the lower bound otherwise
    pub fn anchor(&self) -> i32 {
        match self {
            DecodedParams::Uniform(p) => p.anchor(),
            DecodedParams::Geometric(p) => p.anchor(),
            DecodedParams::DoubleGeometric(p) => p.anchor(),
            DecodedParams::DiscreteLaplace(p) => p.anchor(),
            DecodedParams::CarpetedGeometric(p) => p.anchor(),
        }
    }

    /// The same shape moved to `anchor`
    pub fn with_anchor(self, anchor: i32) -> Self {
        match self {
            DecodedParams::Uniform(p) => DecodedParams::Uniform(p.with_anchor(anchor)),
            DecodedParams::Geometric(p) => DecodedParams::Geometric(p.with_anchor(anchor)),
            DecodedParams::DoubleGeometric(p) => DecodedParams::DoubleGeometric(p.with_anchor(anchor)),
            DecodedParams::DiscreteLaplace(p) => DecodedParams::DiscreteLaplace(p.with_anchor(anchor)),
            DecodedParams::CarpetedGeometric(p) => {
                DecodedParams::CarpetedGeometric(p.with_anchor(anchor))
            }
        }
    }

    pub fn as_distribution(&self) -> &dyn Distribution {
        match self {
            DecodedParams::Uniform(p) => p,
            DecodedParams::Geometric(p) => p,
            DecodedParams::DoubleGeometric(p) => p,
            DecodedParams::DiscreteLaplace(p) => p,
            DecodedParams::CarpetedGeometric(p) => p,
        }
    }
}

/// Pool inputs every evaluation is made against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LdfContext {
    pub tick_spacing: i32,
    /// Reference (TWAP) tick dynamic shapes anchor to
    pub reference_tick: i32,
    /// Persisted LDF state of the pool
    pub state: LdfState,
}

/// A pool's liquidity density function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityDensityFunction {
    pub kind: LdfKind,
    pub params: LdfParams,
}

impl LiquidityDensityFunction {
    pub fn new(kind: LdfKind, params: LdfParams) -> Self {
        Self { kind, params }
    }

    /// Check the parameter record, reporting the first violated rule
    pub fn validate(&self, tick_spacing: i32, twap_seconds_ago: u32) -> CoreResult<()> {
        match self.kind {
            LdfKind::Uniform => uniform::validate(&self.params, tick_spacing, twap_seconds_ago),
            LdfKind::Geometric => geometric::validate(&self.params, tick_spacing, twap_seconds_ago),
            LdfKind::DoubleGeometric => {
                double_geometric::validate(&self.params, tick_spacing, twap_seconds_ago)
            }
            LdfKind::DiscreteLaplace => {
                discrete_laplace::validate(&self.params, tick_spacing, twap_seconds_ago)
            }
            LdfKind::CarpetedGeometric => {
                carpeted_geometric::validate(&self.params, tick_spacing, twap_seconds_ago)
            }
        }
    }

    pub fn is_valid_params(&self, tick_spacing: i32, twap_seconds_ago: u32) -> bool {
        self.validate(tick_spacing, twap_seconds_ago).is_ok()
    }

    /// Decode the record, anchoring dynamic shapes to `reference_tick`
    pub fn decode_params(&self, reference_tick: i32, tick_spacing: i32) -> CoreResult<DecodedParams> {
        let params = &self.params;
        Ok(match self.kind {
            LdfKind::Uniform => {
                DecodedParams::Uniform(uniform::decode_params(params, reference_tick, tick_spacing)?)
            }
            LdfKind::Geometric => {
                DecodedParams::Geometric(geometric::decode_params(params, reference_tick, tick_spacing)?)
            }
            LdfKind::DoubleGeometric => DecodedParams::DoubleGeometric(
                double_geometric::decode_params(params, reference_tick, tick_spacing)?,
            ),
            LdfKind::DiscreteLaplace => DecodedParams::DiscreteLaplace(
                discrete_laplace::decode_params(params, reference_tick, tick_spacing)?,
            ),
            LdfKind::CarpetedGeometric => DecodedParams::CarpetedGeometric(
                carpeted_geometric::decode_params(params, reference_tick, tick_spacing)?,
            ),
        })
    }

    /// Decode and resolve the anchor once for several evaluations
    pub fn resolve(&self, context: &LdfContext) -> CoreResult<ResolvedLdf> {
        let decoded = self.decode_params(context.reference_tick, context.tick_spacing)?;
        let resolution = resolve_anchor(decoded.anchor(), decoded.shift_mode(), context.state);
        if resolution.should_surge {
            debug!(
                kind = ?self.kind,
                last_anchor = context.state.last_anchor,
                anchor = resolution.anchor,
                "LDF anchor moved"
            );
        }
        Ok(ResolvedLdf {
            params: decoded.with_anchor(resolution.anchor),
            resolution,
        })
    }

    /// Half-open tick range holding liquidity for this context
    pub fn domain(&self, context: &LdfContext) -> CoreResult<(i32, i32)> {
        Ok(self.resolve(context)?.domain())
    }

    pub fn query(&self, rounded_tick: i32, context: &LdfContext) -> CoreResult<LdfQuery> {
        self.resolve(context)?.query(rounded_tick)
    }

    pub fn cumulative_amount0(
        &self,
        rounded_tick: i32,
        total_liquidity: u128,
        context: &LdfContext,
    ) -> CoreResult<U256> {
        self.resolve(context)?.cumulative_amount0(rounded_tick, total_liquidity)
    }

    pub fn cumulative_amount1(
        &self,
        rounded_tick: i32,
        total_liquidity: u128,
        context: &LdfContext,
    ) -> CoreResult<U256> {
        self.resolve(context)?.cumulative_amount1(rounded_tick, total_liquidity)
    }

    pub fn inverse_cumulative_amount0(
        &self,
        amount: U256,
        total_liquidity: u128,
        context: &LdfContext,
    ) -> CoreResult<Option<i32>> {
        self.resolve(context)?.inverse_cumulative_amount0(amount, total_liquidity)
    }

    pub fn inverse_cumulative_amount1(
        &self,
        amount: U256,
        total_liquidity: u128,
        context: &LdfContext,
    ) -> CoreResult<Option<i32>> {
        self.resolve(context)?.inverse_cumulative_amount1(amount, total_liquidity)
    }

    pub fn compute_swap(
        &self,
        inverse_cumulative_amount: U256,
        total_liquidity: u128,
        zero_for_one: bool,
        exact_in: bool,
        context: &LdfContext,
    ) -> CoreResult<LdfSwap> {
        self.resolve(context)?
            .compute_swap(inverse_cumulative_amount, total_liquidity, zero_for_one, exact_in)
    }
}

/// Decoded distribution positioned at its resolved anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLdf {
    pub params: DecodedParams,
    pub resolution: AnchorResolution,
}

impl ResolvedLdf {
    fn distribution(&self) -> &dyn Distribution {
        self.params.as_distribution()
    }

    pub fn tick_spacing(&self) -> i32 {
        self.distribution().tick_spacing()
    }

    pub fn domain(&self) -> (i32, i32) {
        self.distribution().domain()
    }

    pub fn new_state(&self) -> LdfState {
        self.resolution.new_state
    }

    pub fn should_surge(&self) -> bool {
        self.resolution.should_surge
    }

    pub fn liquidity_density_x96(&self, rounded_tick: i32) -> CoreResult<U256> {
        self.distribution().liquidity_density_x96(rounded_tick)
    }

    /// Density and cumulative values around `rounded_tick`
    pub fn query(&self, rounded_tick: i32) -> CoreResult<LdfQuery> {
        let query = self.distribution().query(rounded_tick)?;
        Ok(LdfQuery {
            liquidity_density_x96: query.liquidity_density_x96,
            cumulative_right_x96: query.cumulative_right_x96,
            cumulative_left_x96: query.cumulative_left_x96,
            cumulative_amount0_density_x96: query.cumulative_amount0_density_x96,
            cumulative_amount1_density_x96: query.cumulative_amount1_density_x96,
            new_state: self.resolution.new_state,
            should_surge: self.resolution.should_surge,
        })
    }

    pub fn cumulative_amount0(&self, rounded_tick: i32, total_liquidity: u128) -> CoreResult<U256> {
        self.distribution().cumulative_amount0(rounded_tick, total_liquidity)
    }

    pub fn cumulative_amount1(&self, rounded_tick: i32, total_liquidity: u128) -> CoreResult<U256> {
        self.distribution().cumulative_amount1(rounded_tick, total_liquidity)
    }

    pub fn inverse_cumulative_amount0(
        &self,
        amount: U256,
        total_liquidity: u128,
    ) -> CoreResult<Option<i32>> {
        self.distribution().inverse_cumulative_amount0(amount, total_liquidity)
    }

    pub fn inverse_cumulative_amount1(
        &self,
        amount: U256,
        total_liquidity: u128,
    ) -> CoreResult<Option<i32>> {
        self.distribution().inverse_cumulative_amount1(amount, total_liquidity)
    }

    /// Locate the tick where a cumulative token balance is reached
    ///
    /// Token0 is inverted when `exact_in == zero_for_one`, token1 otherwise.
    /// The returned cumulative amounts are the balances at the boundary the
    /// partial swap inside `rounded_tick` starts from: the upper boundary when
    /// swapping token0 for token1, the lower one otherwise.
    pub fn compute_swap(
        &self,
        inverse_cumulative_amount: U256,
        total_liquidity: u128,
        zero_for_one: bool,
        exact_in: bool,
    ) -> CoreResult<LdfSwap> {
        let dist = self.distribution();
        let s = dist.tick_spacing();

        let found = if exact_in == zero_for_one {
            dist.inverse_cumulative_amount0(inverse_cumulative_amount, total_liquidity)?
        } else {
            dist.inverse_cumulative_amount1(inverse_cumulative_amount, total_liquidity)?
        };
        let Some(rounded_tick) = found else {
            debug!(
                target_amount = %inverse_cumulative_amount,
                total_liquidity,
                zero_for_one,
                exact_in,
                "cumulative amount inversion failed"
            );
            return Ok(LdfSwap::failed());
        };

        let (cumulative_amount0, cumulative_amount1) = if zero_for_one {
            (
                dist.cumulative_amount0(rounded_tick + s, total_liquidity)?,
                dist.cumulative_amount1(rounded_tick, total_liquidity)?,
            )
        } else {
            (
                dist.cumulative_amount0(rounded_tick, total_liquidity)?,
                dist.cumulative_amount1(rounded_tick - s, total_liquidity)?,
            )
        };

        let density = dist.liquidity_density_x96(rounded_tick)?;
        let swap_liquidity = to_u128(mul_div(density, U256::new(total_liquidity), Q96, Rounding::Down)?)?;
        trace!(rounded_tick, swap_liquidity, "inverted cumulative amount");

        Ok(LdfSwap {
            success: true,
            rounded_tick,
            cumulative_amount0,
            cumulative_amount1,
            swap_liquidity,
        })
    }
}

//! # Liquidity Density Functions
//!
//! The five distribution families. Each one decodes its packed parameters into
//! a plain struct, validates them, and lays its shape out as geometric
//! segments; density, cumulative sums and their inverses are shared through
//! the [`Distribution`] trait.
//!
//! Tick conventions, with `s` the tick spacing and every tick rounded:
//! - `cumulative_right_x96(t)` / `cumulative_left_x96(t)` sum density strictly
//!   right / left of `t`
//! - `cumulative_amount0_x96(t)` sums token0 over ticks `>= t`,
//!   `cumulative_amount1_x96(t)` sums token1 over ticks `<= t`

pub mod carpeted_geometric;
pub mod discrete_laplace;
pub mod double_geometric;
pub mod geometric;
pub mod segment;
pub mod uniform;

pub use carpeted_geometric::CarpetedGeometricParams;
pub use discrete_laplace::DiscreteLaplaceParams;
pub use double_geometric::DoubleGeometricParams;
pub use geometric::GeometricParams;
pub use segment::{Segment, Weighting};
pub use uniform::UniformParams;

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ALPHA_BASE, MAX_ALPHA, MAX_INT24, MIN_ALPHA, MIN_LIQUIDITY_DENSITY_X96, Q96,
};
use crate::errors::{CoreResult, LdfCoreError};
use crate::math::big_int::{mul_div, Rounding};
use crate::math::fixed_point::{alpha_to_x96, rpow_q96};
use crate::math::tick_math::{is_tick_spacing_valid, max_usable_tick, min_usable_tick, round_tick_single};
use crate::types::{LdfParams, ShiftMode};

/// Left or right side of a tick, or end of a run of ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Density and cumulative values of a distribution at one rounded tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DensityQuery {
    pub liquidity_density_x96: U256,
    pub cumulative_right_x96: U256,
    pub cumulative_left_x96: U256,
    /// Token0 per Q96 liquidity over ticks right of the rounded tick
    pub cumulative_amount0_density_x96: U256,
    /// Token1 per Q96 liquidity over ticks left of the rounded tick
    pub cumulative_amount1_density_x96: U256,
}

// ============================================================================
// Distribution Trait
// ============================================================================

/// A decoded distribution laid out on a tick spacing
pub trait Distribution {
    fn tick_spacing(&self) -> i32;

    /// Half-open range `[start, end)` of rounded ticks that may hold liquidity
    fn domain(&self) -> (i32, i32);

    /// Disjoint segments covering the domain, ordered by start tick
    fn segments(&self) -> CoreResult<Vec<Segment>>;

    /// Density of a rounded tick, zero outside the domain
    fn liquidity_density_x96(&self, rounded_tick: i32) -> CoreResult<U256> {
        segment::density_x96(&self.segments()?, rounded_tick, self.tick_spacing())
    }

    /// Density of every tick strictly right of `rounded_tick`
    fn cumulative_right_x96(&self, rounded_tick: i32) -> CoreResult<U256> {
        let s = self.tick_spacing();
        segment::sum_at_or_above(&self.segments()?, Weighting::Density, rounded_tick + s, s)
    }

    /// Density of every tick strictly left of `rounded_tick`
    fn cumulative_left_x96(&self, rounded_tick: i32) -> CoreResult<U256> {
        let s = self.tick_spacing();
        segment::sum_at_or_below(&self.segments()?, Weighting::Density, rounded_tick - s, s)
    }

    /// Invert a cumulative density
    ///
    /// `Right` returns the largest tick whose right-hand density is at least
    /// `target_x96`, `Left` the smallest tick whose left-hand density is. A
    /// zero target resolves to the outermost tick of the domain on that side;
    /// a target above the total mass yields `None`.
    fn inverse_cumulative(&self, side: Side, target_x96: U256) -> CoreResult<Option<i32>> {
        let s = self.tick_spacing();
        let (start, end) = self.domain();
        if target_x96 == U256::ZERO {
            return Ok(Some(match side {
                Side::Right => end - s,
                Side::Left => start,
            }));
        }
        let segments = self.segments()?;
        Ok(match side {
            Side::Right => segment::inverse_at_or_above(&segments, Weighting::Density, target_x96, s)?
                .map(|tick| tick - s),
            Side::Left => segment::inverse_at_or_below(&segments, Weighting::Density, target_x96, s)?
                .map(|tick| tick + s),
        })
    }

    /// Token0 per Q96 liquidity held by ticks `>= rounded_tick`
    fn cumulative_amount0_x96(&self, rounded_tick: i32) -> CoreResult<U256> {
        let s = self.tick_spacing();
        segment::sum_at_or_above(&self.segments()?, Weighting::Amount0, rounded_tick, s)
    }

    /// Token1 per Q96 liquidity held by ticks `<= rounded_tick`
    fn cumulative_amount1_x96(&self, rounded_tick: i32) -> CoreResult<U256> {
        let s = self.tick_spacing();
        segment::sum_at_or_below(&self.segments()?, Weighting::Amount1, rounded_tick, s)
    }

    /// Largest tick whose token0 cumulative reaches `target_x96`
    fn inverse_cumulative_amount0_x96(&self, target_x96: U256) -> CoreResult<Option<i32>> {
        if target_x96 == U256::ZERO {
            return Ok(Some(self.domain().1));
        }
        segment::inverse_at_or_above(&self.segments()?, Weighting::Amount0, target_x96, self.tick_spacing())
    }

    /// Smallest tick whose token1 cumulative reaches `target_x96`
    fn inverse_cumulative_amount1_x96(&self, target_x96: U256) -> CoreResult<Option<i32>> {
        if target_x96 == U256::ZERO {
            return Ok(Some(self.domain().0 - self.tick_spacing()));
        }
        segment::inverse_at_or_below(&self.segments()?, Weighting::Amount1, target_x96, self.tick_spacing())
    }

    /// Token0 held by ticks `>= rounded_tick` for `total_liquidity`
    fn cumulative_amount0(&self, rounded_tick: i32, total_liquidity: u128) -> CoreResult<U256> {
        liquidity_amount(self.cumulative_amount0_x96(rounded_tick)?, total_liquidity)
    }

    /// Token1 held by ticks `<= rounded_tick` for `total_liquidity`
    fn cumulative_amount1(&self, rounded_tick: i32, total_liquidity: u128) -> CoreResult<U256> {
        liquidity_amount(self.cumulative_amount1_x96(rounded_tick)?, total_liquidity)
    }

    fn inverse_cumulative_amount0(
        &self,
        amount: U256,
        total_liquidity: u128,
    ) -> CoreResult<Option<i32>> {
        match amount_to_density(amount, total_liquidity)? {
            Some(target_x96) => self.inverse_cumulative_amount0_x96(target_x96),
            None => Ok(None),
        }
    }

    fn inverse_cumulative_amount1(
        &self,
        amount: U256,
        total_liquidity: u128,
    ) -> CoreResult<Option<i32>> {
        match amount_to_density(amount, total_liquidity)? {
            Some(target_x96) => self.inverse_cumulative_amount1_x96(target_x96),
            None => Ok(None),
        }
    }

    /// Density, cumulative densities and cumulative amounts around a rounded tick
    fn query(&self, rounded_tick: i32) -> CoreResult<DensityQuery> {
        let s = self.tick_spacing();
        let segments = self.segments()?;
        Ok(DensityQuery {
            liquidity_density_x96: segment::density_x96(&segments, rounded_tick, s)?,
            cumulative_right_x96: segment::sum_at_or_above(
                &segments,
                Weighting::Density,
                rounded_tick + s,
                s,
            )?,
            cumulative_left_x96: segment::sum_at_or_below(
                &segments,
                Weighting::Density,
                rounded_tick - s,
                s,
            )?,
            cumulative_amount0_density_x96: segment::sum_at_or_above(
                &segments,
                Weighting::Amount0,
                rounded_tick + s,
                s,
            )?,
            cumulative_amount1_density_x96: segment::sum_at_or_below(
                &segments,
                Weighting::Amount1,
                rounded_tick - s,
                s,
            )?,
        })
    }
}

/// Token amount held by `total_liquidity` given an amount per Q96 liquidity
pub fn liquidity_amount(density_amount_x96: U256, total_liquidity: u128) -> CoreResult<U256> {
    mul_div(density_amount_x96, U256::new(total_liquidity), Q96, Rounding::Down)
}

/// Amount per Q96 liquidity for a token amount, rounded up
///
/// `None` when there is no liquidity to hold a non-zero amount.
fn amount_to_density(amount: U256, total_liquidity: u128) -> CoreResult<Option<U256>> {
    if amount == U256::ZERO {
        return Ok(Some(U256::ZERO));
    }
    if total_liquidity == 0 {
        return Ok(None);
    }
    mul_div(amount, Q96, U256::new(total_liquidity), Rounding::Up).map(Some)
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Usable tick range `[min_usable, max_usable]` for a tick spacing
pub fn usable_range(tick_spacing: i32) -> (i32, i32) {
    (min_usable_tick(tick_spacing), max_usable_tick(tick_spacing))
}

/// Anchor derived from the reference tick, kept inside `[min_anchor, max_anchor]`
pub fn dynamic_anchor(
    reference_tick: i32,
    offset: i32,
    tick_spacing: i32,
    min_anchor: i32,
    max_anchor: i32,
) -> i32 {
    round_tick_single(reference_tick.saturating_add(offset), tick_spacing)
        .clamp(min_anchor, max_anchor.max(min_anchor))
}

/// Checks shared by every family before its own layout is inspected
pub(crate) fn validate_common(
    params: &LdfParams,
    tick_spacing: i32,
    twap_seconds_ago: u32,
) -> CoreResult<ShiftMode> {
    if !is_tick_spacing_valid(tick_spacing) {
        return Err(LdfCoreError::InvalidTickSpacing(tick_spacing));
    }
    let shift_mode = params.shift_mode()?;
    if shift_mode.is_dynamic() && twap_seconds_ago == 0 {
        return Err(LdfCoreError::invalid_params("dynamic shift mode needs a TWAP window"));
    }
    Ok(shift_mode)
}

/// Width in ticks of `length` rounded ticks, checked against the packed tick width
pub(crate) fn validate_span(length: i64, tick_spacing: i32) -> CoreResult<i32> {
    if length <= 0 {
        return Err(LdfCoreError::invalid_params("length must be positive"));
    }
    let span = length * tick_spacing as i64;
    if span > MAX_INT24 as i64 {
        return Err(LdfCoreError::invalid_params("length overflows a 24-bit tick"));
    }
    Ok(span as i32)
}

/// Checks that the anchor is aligned and, for static shapes, that
/// `[anchor, anchor + span)` lies in the usable range
pub(crate) fn validate_placement(
    anchor_or_offset: i32,
    span: i32,
    shift_mode: ShiftMode,
    tick_spacing: i32,
) -> CoreResult<()> {
    if anchor_or_offset % tick_spacing != 0 {
        return Err(LdfCoreError::invalid_params("anchor not aligned to tick spacing"));
    }
    let (min_usable, max_usable) = usable_range(tick_spacing);
    let fits = if shift_mode.is_dynamic() {
        span <= max_usable - min_usable
    } else {
        anchor_or_offset >= min_usable && anchor_or_offset as i64 + span as i64 <= max_usable as i64
    };
    if !fits {
        return Err(LdfCoreError::invalid_params("distribution exceeds usable tick range"));
    }
    Ok(())
}

/// Alpha bounds of the geometric families
pub(crate) fn validate_alpha(alpha: u32) -> CoreResult<()> {
    if !(MIN_ALPHA..=MAX_ALPHA).contains(&alpha) {
        return Err(LdfCoreError::invalid_params("alpha out of range"));
    }
    if alpha == ALPHA_BASE {
        return Err(LdfCoreError::invalid_params("alpha must not be 1"));
    }
    Ok(())
}

/// Minimum density floor, checked on the tick furthest from the peak
pub(crate) fn validate_min_density(segment: &Segment) -> CoreResult<()> {
    if segment.min_density_x96()? < MIN_LIQUIDITY_DENSITY_X96 {
        return Err(LdfCoreError::invalid_params("minimum liquidity density too low"));
    }
    Ok(())
}

/// Normalized peak of a truncated geometric series: `(1 - q) / (1 - q^n)`
pub(crate) fn geometric_peak_x96(decay_x96: U256, length: u32) -> CoreResult<U256> {
    if length == 0 {
        return Ok(U256::ZERO);
    }
    if decay_x96 >= Q96 {
        return Ok(Q96 / U256::from(length));
    }
    let denominator = Q96 - rpow_q96(decay_x96, length)?;
    mul_div(Q96, Q96 - decay_x96, denominator, Rounding::Down)
}

/// Normalized geometric run of `length` ticks with per-tick ratio `alpha`
///
/// `alpha < 1` puts the peak on the left. Above 1 the density rises to the
/// right, computed as the reciprocal decay from a right-hand peak so that the
/// base of every power stays below 1.
pub(crate) fn geometric_segment(start_tick: i32, length: u32, alpha: u32) -> CoreResult<Segment> {
    let (decay_x96, peak) = if alpha < ALPHA_BASE {
        (alpha_to_x96(alpha)?, Side::Left)
    } else {
        let decay = mul_div(U256::from(ALPHA_BASE), Q96, U256::from(alpha), Rounding::Down)?;
        (decay, Side::Right)
    };
    Ok(Segment {
        start_tick,
        length,
        peak_x96: geometric_peak_x96(decay_x96, length)?,
        decay_x96,
        peak,
    })
}

//! # Carpeted Geometric Distribution
//!
//! A geometric core over `[min_tick, min_tick + length * s)` carrying
//! `1 - w_carpet` of the mass, on top of a uniform carpet spreading `w_carpet`
//! evenly over every other usable tick. The carpet keeps some liquidity at any
//! price the pool can reach.
//!
//! Record layout: `shift(1) | min_tick_or_offset(3) | length(2) | alpha(4) | weight_carpet(4)`,
//! the carpet weight with 9 decimals.

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{Q96, WEIGHT_BASE};
use crate::distributions::{
    dynamic_anchor, geometric_segment, usable_range, validate_alpha, validate_common,
    validate_min_density, validate_placement, validate_span, Distribution, Segment,
};
use crate::errors::{CoreResult, LdfCoreError};
use crate::math::big_int::{mul_div, Rounding};
use crate::types::{LdfParams, LdfParamsWriter, ShiftMode};

/// Decoded carpeted geometric parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarpetedGeometricParams {
    pub tick_spacing: i32,
    pub min_tick: i32,
    pub length: u32,
    pub alpha: u32,
    /// Share of the mass on the carpet, 9 decimals
    pub weight_carpet: u32,
    pub shift_mode: ShiftMode,
}

impl CarpetedGeometricParams {
    pub fn anchor(&self) -> i32 {
        self.min_tick
    }

    pub fn with_anchor(self, anchor: i32) -> Self {
        Self {
            min_tick: anchor,
            ..self
        }
    }

    pub fn core_end(&self) -> i32 {
        self.min_tick + self.length as i32 * self.tick_spacing
    }

    /// Density of every carpet tick
    pub fn carpet_density_x96(&self) -> CoreResult<U256> {
        let count = carpet_tick_count(self.tick_spacing, self.length);
        if count == 0 {
            return Ok(U256::ZERO);
        }
        mul_div(
            U256::from(self.weight_carpet),
            Q96,
            U256::from(WEIGHT_BASE) * U256::from(count),
            Rounding::Down,
        )
    }

    fn core(&self) -> CoreResult<Segment> {
        scaled_core(self.min_tick, self.length, self.alpha, self.weight_carpet)
    }
}

/// Usable ticks outside a core of `length` ticks
fn carpet_tick_count(tick_spacing: i32, length: u32) -> u32 {
    let (min_usable, max_usable) = usable_range(tick_spacing);
    let usable = ((max_usable - min_usable) / tick_spacing) as u32;
    usable.saturating_sub(length)
}

fn scaled_core(start_tick: i32, length: u32, alpha: u32, weight_carpet: u32) -> CoreResult<Segment> {
    let weight_core = WEIGHT_BASE.saturating_sub(weight_carpet);
    geometric_segment(start_tick, length, alpha)?.scaled(weight_core as u64, WEIGHT_BASE as u64)
}

/// Pack carpeted geometric parameters
pub fn encode_params(
    shift_mode: ShiftMode,
    min_tick_or_offset: i32,
    length: i16,
    alpha: u32,
    weight_carpet: u32,
) -> LdfParams {
    LdfParamsWriter::new(shift_mode)
        .i24(min_tick_or_offset)
        .i16(length)
        .u32(alpha)
        .u32(weight_carpet)
        .finish()
}

/// Decode carpeted geometric parameters, anchoring dynamic cores to `reference_tick`
pub fn decode_params(
    params: &LdfParams,
    reference_tick: i32,
    tick_spacing: i32,
) -> CoreResult<CarpetedGeometricParams> {
    let shift_mode = params.shift_mode()?;
    let min_tick_or_offset = params.read_i24(1);
    let length = u32::try_from(params.read_i16(4))
        .map_err(|_| LdfCoreError::invalid_params("length must be positive"))?;
    let alpha = params.read_u32(6);
    let weight_carpet = params.read_u32(10);

    let min_tick = if shift_mode.is_dynamic() {
        let (min_usable, max_usable) = usable_range(tick_spacing);
        let span = length as i32 * tick_spacing;
        dynamic_anchor(reference_tick, min_tick_or_offset, tick_spacing, min_usable, max_usable - span)
    } else {
        min_tick_or_offset
    };

    Ok(CarpetedGeometricParams {
        tick_spacing,
        min_tick,
        length,
        alpha,
        weight_carpet,
        shift_mode,
    })
}

/// Validate a packed carpeted geometric record
pub fn validate(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> CoreResult<()> {
    let shift_mode = validate_common(params, tick_spacing, twap_seconds_ago)?;
    let min_tick_or_offset = params.read_i24(1);
    let length = params.read_i16(4);
    let alpha = params.read_u32(6);
    let weight_carpet = params.read_u32(10);

    let span = validate_span(length as i64, tick_spacing)?;
    validate_placement(min_tick_or_offset, span, shift_mode, tick_spacing)?;
    validate_alpha(alpha)?;
    if weight_carpet == 0 || weight_carpet >= WEIGHT_BASE {
        return Err(LdfCoreError::invalid_params("carpet weight must be in (0, 1)"));
    }
    if carpet_tick_count(tick_spacing, length as u32) == 0 {
        return Err(LdfCoreError::invalid_params("no ticks left for the carpet"));
    }
    validate_min_density(&scaled_core(0, length as u32, alpha, weight_carpet)?)
}

pub fn is_valid_params(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> bool {
    validate(params, tick_spacing, twap_seconds_ago).is_ok()
}

impl Distribution for CarpetedGeometricParams {
    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn domain(&self) -> (i32, i32) {
        usable_range(self.tick_spacing)
    }

    fn segments(&self) -> CoreResult<Vec<Segment>> {
        let s = self.tick_spacing;
        let (min_usable, max_usable) = usable_range(s);
        let carpet = self.carpet_density_x96()?;

        let mut segments = Vec::with_capacity(3);
        if self.min_tick > min_usable {
            let length = ((self.min_tick - min_usable) / s) as u32;
            segments.push(Segment::uniform(min_usable, length, carpet));
        }
        segments.push(self.core()?);
        if self.core_end() < max_usable {
            let length = ((max_usable - self.core_end()) / s) as u32;
            segments.push(Segment::uniform(self.core_end(), length, carpet));
        }
        Ok(segments)
    }
}

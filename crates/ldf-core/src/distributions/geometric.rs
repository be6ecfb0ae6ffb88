//! # Geometric Distribution
//!
//! Truncated geometric density over `length` rounded ticks starting at
//! `min_tick`:
//!
//! ```text
//! density(min_tick + x * s) = alpha^x (1 - alpha) / (1 - alpha^length)
//! ```
//!
//! Record layout: `shift(1) | min_tick_or_offset(3) | length(2) | alpha(4)`.

use serde::{Deserialize, Serialize};

use crate::distributions::{
    dynamic_anchor, geometric_segment, usable_range, validate_alpha, validate_common,
    validate_min_density, validate_placement, validate_span, Distribution, Segment,
};
use crate::errors::{CoreResult, LdfCoreError};
use crate::types::{LdfParams, LdfParamsWriter, ShiftMode};

/// Decoded geometric parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometricParams {
    pub tick_spacing: i32,
    pub min_tick: i32,
    /// Number of rounded ticks
    pub length: u32,
    /// Per-tick ratio with 8 decimals
    pub alpha: u32,
    pub shift_mode: ShiftMode,
}

impl GeometricParams {
    pub fn anchor(&self) -> i32 {
        self.min_tick
    }

    pub fn with_anchor(self, anchor: i32) -> Self {
        Self {
            min_tick: anchor,
            ..self
        }
    }
}

/// Pack geometric parameters
pub fn encode_params(shift_mode: ShiftMode, min_tick_or_offset: i32, length: i16, alpha: u32) -> LdfParams {
    LdfParamsWriter::new(shift_mode)
        .i24(min_tick_or_offset)
        .i16(length)
        .u32(alpha)
        .finish()
}

/// Decode geometric parameters, anchoring dynamic shapes to `reference_tick`
pub fn decode_params(
    params: &LdfParams,
    reference_tick: i32,
    tick_spacing: i32,
) -> CoreResult<GeometricParams> {
    let shift_mode = params.shift_mode()?;
    let min_tick_or_offset = params.read_i24(1);
    let length = u32::try_from(params.read_i16(4))
        .map_err(|_| LdfCoreError::invalid_params("length must be positive"))?;
    let alpha = params.read_u32(6);

    let min_tick = if shift_mode.is_dynamic() {
        let (min_usable, max_usable) = usable_range(tick_spacing);
        let span = length as i32 * tick_spacing;
        dynamic_anchor(reference_tick, min_tick_or_offset, tick_spacing, min_usable, max_usable - span)
    } else {
        min_tick_or_offset
    };

    Ok(GeometricParams {
        tick_spacing,
        min_tick,
        length,
        alpha,
        shift_mode,
    })
}

/// Validate a packed geometric record
pub fn validate(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> CoreResult<()> {
    let shift_mode = validate_common(params, tick_spacing, twap_seconds_ago)?;
    let min_tick_or_offset = params.read_i24(1);
    let length = params.read_i16(4);
    let alpha = params.read_u32(6);

    let span = validate_span(length as i64, tick_spacing)?;
    validate_placement(min_tick_or_offset, span, shift_mode, tick_spacing)?;
    validate_alpha(alpha)?;
    validate_min_density(&geometric_segment(0, length as u32, alpha)?)
}

pub fn is_valid_params(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> bool {
    validate(params, tick_spacing, twap_seconds_ago).is_ok()
}

impl Distribution for GeometricParams {
    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn domain(&self) -> (i32, i32) {
        (
            self.min_tick,
            self.min_tick + self.length as i32 * self.tick_spacing,
        )
    }

    fn segments(&self) -> CoreResult<Vec<Segment>> {
        Ok(vec![geometric_segment(self.min_tick, self.length, self.alpha)?])
    }
}

//! # Uniform Distribution
//!
//! Equal density on every rounded tick of `[tick_lower, tick_upper)`.
//!
//! Record layouts:
//! - static: `shift(1) | tick_lower(3) | tick_upper(3)`
//! - dynamic: `shift(1) | offset(3) | length(3)`, the range starting at the
//!   rounded `reference_tick + offset`

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::constants::Q96;
use crate::distributions::{
    dynamic_anchor, usable_range, validate_common, validate_placement, validate_span,
    Distribution, Segment,
};
use crate::errors::{CoreResult, LdfCoreError};
use crate::types::{LdfParams, LdfParamsWriter, ShiftMode};

/// Decoded uniform parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformParams {
    pub tick_spacing: i32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub shift_mode: ShiftMode,
}

impl UniformParams {
    /// Number of rounded ticks in the range
    pub fn length(&self) -> u32 {
        ((self.tick_upper - self.tick_lower) / self.tick_spacing) as u32
    }

    pub fn anchor(&self) -> i32 {
        self.tick_lower
    }

    /// Same width, moved to start at `anchor`
    pub fn with_anchor(self, anchor: i32) -> Self {
        Self {
            tick_lower: anchor,
            tick_upper: anchor + (self.tick_upper - self.tick_lower),
            ..self
        }
    }
}

/// Pack uniform parameters
///
/// Static records take `(tick_lower, tick_upper)`, dynamic ones
/// `(offset, length)`.
pub fn encode_params(shift_mode: ShiftMode, lower_or_offset: i32, upper_or_length: i32) -> LdfParams {
    LdfParamsWriter::new(shift_mode)
        .i24(lower_or_offset)
        .i24(upper_or_length)
        .finish()
}

/// Decode uniform parameters, anchoring dynamic ranges to `reference_tick`
pub fn decode_params(
    params: &LdfParams,
    reference_tick: i32,
    tick_spacing: i32,
) -> CoreResult<UniformParams> {
    let shift_mode = params.shift_mode()?;
    let first = params.read_i24(1);
    let second = params.read_i24(4);

    let (tick_lower, tick_upper) = if shift_mode.is_dynamic() {
        if second <= 0 {
            return Err(LdfCoreError::invalid_params("length must be positive"));
        }
        let span = second as i64 * tick_spacing as i64;
        let (min_usable, max_usable) = usable_range(tick_spacing);
        let max_anchor = (max_usable as i64 - span).max(min_usable as i64) as i32;
        let lower = dynamic_anchor(reference_tick, first, tick_spacing, min_usable, max_anchor);
        let upper = i32::try_from(lower as i64 + span)
            .map_err(|_| LdfCoreError::invalid_params("length overflows a tick"))?;
        (lower, upper)
    } else {
        (first, second)
    };

    if tick_upper <= tick_lower {
        return Err(LdfCoreError::invalid_params("empty tick range"));
    }

    Ok(UniformParams {
        tick_spacing,
        tick_lower,
        tick_upper,
        shift_mode,
    })
}

/// Validate a packed uniform record
pub fn validate(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> CoreResult<()> {
    let shift_mode = validate_common(params, tick_spacing, twap_seconds_ago)?;
    let first = params.read_i24(1);
    let second = params.read_i24(4);

    if shift_mode.is_dynamic() {
        let span = validate_span(second as i64, tick_spacing)?;
        return validate_placement(first, span, shift_mode, tick_spacing);
    }

    if second % tick_spacing != 0 {
        return Err(LdfCoreError::invalid_params("anchor not aligned to tick spacing"));
    }
    let span = validate_span((second as i64 - first as i64) / tick_spacing as i64, tick_spacing)?;
    validate_placement(first, span, shift_mode, tick_spacing)
}

pub fn is_valid_params(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> bool {
    validate(params, tick_spacing, twap_seconds_ago).is_ok()
}

impl Distribution for UniformParams {
    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn domain(&self) -> (i32, i32) {
        (self.tick_lower, self.tick_upper)
    }

    fn segments(&self) -> CoreResult<Vec<Segment>> {
        let length = self.length();
        if length == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![Segment::uniform(
            self.tick_lower,
            length,
            Q96 / U256::from(length),
        )])
    }
}

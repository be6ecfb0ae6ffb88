//! # Discrete Laplace Distribution
//!
//! Two-sided geometric density centred on `mu`, truncated to the usable tick
//! range:
//!
//! ```text
//! density(mu + x * s) = P * alpha^|x|
//! P = (1 - alpha) / (1 + alpha - alpha^B - alpha^(A + 1))
//! ```
//!
//! where `A` counts the rounded ticks left of `mu` and `B` those from `mu` to
//! the right edge. Laid out as a right-hand run starting at `mu` and a
//! left-hand run ending just below it, both decaying away from `mu`.
//!
//! Record layout: `shift(1) | mu_or_offset(3) | alpha(4)`.

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{ALPHA_BASE, MIN_ALPHA, Q96};
use crate::distributions::{
    dynamic_anchor, usable_range, validate_common, validate_placement, Distribution, Segment,
    Side,
};
use crate::errors::{CoreResult, LdfCoreError};
use crate::math::big_int::{mul_div, Rounding};
use crate::math::fixed_point::{alpha_to_x96, mul_q96, rpow_q96};
use crate::types::{LdfParams, LdfParamsWriter, ShiftMode};

/// Decoded discrete Laplace parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteLaplaceParams {
    pub tick_spacing: i32,
    pub mu: i32,
    /// Per-tick decay with 8 decimals, below 1
    pub alpha: u32,
    pub shift_mode: ShiftMode,
}

impl DiscreteLaplaceParams {
    pub fn anchor(&self) -> i32 {
        self.mu
    }

    pub fn with_anchor(self, anchor: i32) -> Self {
        Self { mu: anchor, ..self }
    }

    /// Rounded ticks strictly left of `mu` and from `mu` to the right edge
    fn tick_counts(&self) -> (u32, u32) {
        let (min_usable, max_usable) = usable_range(self.tick_spacing);
        let left = ((self.mu - min_usable) / self.tick_spacing) as u32;
        let right = ((max_usable - self.mu) / self.tick_spacing) as u32;
        (left, right)
    }

    /// Density at `mu`
    pub fn peak_density_x96(&self) -> CoreResult<U256> {
        let alpha_x96 = alpha_to_x96(self.alpha)?;
        let (left, right) = self.tick_counts();
        let tails = rpow_q96(alpha_x96, right)? + rpow_q96(alpha_x96, left + 1)?;
        let denominator = (Q96 + alpha_x96)
            .checked_sub(tails)
            .ok_or(LdfCoreError::MathUnderflow)?;
        mul_div(Q96, Q96 - alpha_x96, denominator, Rounding::Down)
    }
}

/// Pack discrete Laplace parameters
pub fn encode_params(shift_mode: ShiftMode, mu_or_offset: i32, alpha: u32) -> LdfParams {
    LdfParamsWriter::new(shift_mode)
        .i24(mu_or_offset)
        .u32(alpha)
        .finish()
}

/// Decode discrete Laplace parameters, centring dynamic shapes on `reference_tick`
pub fn decode_params(
    params: &LdfParams,
    reference_tick: i32,
    tick_spacing: i32,
) -> CoreResult<DiscreteLaplaceParams> {
    let shift_mode = params.shift_mode()?;
    let mu_or_offset = params.read_i24(1);
    let alpha = params.read_u32(4);

    let mu = if shift_mode.is_dynamic() {
        let (min_usable, max_usable) = usable_range(tick_spacing);
        dynamic_anchor(reference_tick, mu_or_offset, tick_spacing, min_usable, max_usable - tick_spacing)
    } else {
        mu_or_offset
    };

    Ok(DiscreteLaplaceParams {
        tick_spacing,
        mu,
        alpha,
        shift_mode,
    })
}

/// Validate a packed discrete Laplace record
///
/// The density floor is not enforced: the tails of a Laplace shape over the
/// whole usable range always fall below it.
pub fn validate(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> CoreResult<()> {
    let shift_mode = validate_common(params, tick_spacing, twap_seconds_ago)?;
    let mu_or_offset = params.read_i24(1);
    let alpha = params.read_u32(4);

    validate_placement(mu_or_offset, tick_spacing, shift_mode, tick_spacing)?;
    if !(MIN_ALPHA..ALPHA_BASE).contains(&alpha) {
        return Err(LdfCoreError::invalid_params("alpha must be in [MIN_ALPHA, 1)"));
    }
    Ok(())
}

pub fn is_valid_params(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> bool {
    validate(params, tick_spacing, twap_seconds_ago).is_ok()
}

impl Distribution for DiscreteLaplaceParams {
    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn domain(&self) -> (i32, i32) {
        usable_range(self.tick_spacing)
    }

    fn segments(&self) -> CoreResult<Vec<Segment>> {
        let (min_usable, _) = usable_range(self.tick_spacing);
        let (left, right) = self.tick_counts();
        let decay_x96 = alpha_to_x96(self.alpha)?;
        let peak_x96 = self.peak_density_x96()?;

        let mut segments = Vec::with_capacity(2);
        if left > 0 {
            segments.push(Segment {
                start_tick: min_usable,
                length: left,
                peak_x96: mul_q96(peak_x96, decay_x96, Rounding::Down)?,
                decay_x96,
                peak: Side::Right,
            });
        }
        segments.push(Segment {
            start_tick: self.mu,
            length: right,
            peak_x96,
            decay_x96,
            peak: Side::Left,
        });
        Ok(segments)
    }
}

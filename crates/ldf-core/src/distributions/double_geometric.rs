//! # Double-Geometric Distribution
//!
//! Two adjacent geometric pieces sharing one anchor. The left piece covers
//! `[min_tick, min_tick + length1 * s)` with `(alpha1, weight1)`, the right
//! piece the following `length0` ticks with `(alpha0, weight0)`. Each piece is
//! normalized on its own and then scaled by its share of `weight0 + weight1`.
//!
//! Record layout:
//! `shift(1) | min_tick_or_offset(3) | length0(2) | alpha0(4) | weight0(4) | length1(2) | alpha1(4) | weight1(4)`.

use serde::{Deserialize, Serialize};

use crate::distributions::{
    dynamic_anchor, geometric_segment, usable_range, validate_alpha, validate_common,
    validate_min_density, validate_placement, validate_span, Distribution, Segment,
};
use crate::errors::{CoreResult, LdfCoreError};
use crate::types::{LdfParams, LdfParamsWriter, ShiftMode};

/// One geometric piece: length in rounded ticks, alpha and relative weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometricPiece {
    pub length: u32,
    pub alpha: u32,
    pub weight: u32,
}

/// Decoded double-geometric parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleGeometricParams {
    pub tick_spacing: i32,
    pub min_tick: i32,
    /// Right-hand piece
    pub piece0: GeometricPiece,
    /// Left-hand piece
    pub piece1: GeometricPiece,
    pub shift_mode: ShiftMode,
}

impl DoubleGeometricParams {
    pub fn anchor(&self) -> i32 {
        self.min_tick
    }

    pub fn with_anchor(self, anchor: i32) -> Self {
        Self {
            min_tick: anchor,
            ..self
        }
    }

    /// First tick of the right-hand piece
    pub fn junction_tick(&self) -> i32 {
        self.min_tick + self.piece1.length as i32 * self.tick_spacing
    }

    fn total_weight(&self) -> u64 {
        self.piece0.weight as u64 + self.piece1.weight as u64
    }
}

/// Pack double-geometric parameters
pub fn encode_params(
    shift_mode: ShiftMode,
    min_tick_or_offset: i32,
    piece0: (i16, u32, u32),
    piece1: (i16, u32, u32),
) -> LdfParams {
    LdfParamsWriter::new(shift_mode)
        .i24(min_tick_or_offset)
        .i16(piece0.0)
        .u32(piece0.1)
        .u32(piece0.2)
        .i16(piece1.0)
        .u32(piece1.1)
        .u32(piece1.2)
        .finish()
}

fn read_piece(params: &LdfParams, offset: usize) -> (i16, u32, u32) {
    (
        params.read_i16(offset),
        params.read_u32(offset + 2),
        params.read_u32(offset + 6),
    )
}

fn positive_length(length: i16) -> CoreResult<u32> {
    match u32::try_from(length) {
        Ok(length) if length > 0 => Ok(length),
        _ => Err(LdfCoreError::invalid_params("length must be positive")),
    }
}

/// Decode double-geometric parameters, anchoring dynamic shapes to `reference_tick`
pub fn decode_params(
    params: &LdfParams,
    reference_tick: i32,
    tick_spacing: i32,
) -> CoreResult<DoubleGeometricParams> {
    let shift_mode = params.shift_mode()?;
    let min_tick_or_offset = params.read_i24(1);
    let (length0, alpha0, weight0) = read_piece(params, 4);
    let (length1, alpha1, weight1) = read_piece(params, 14);

    let piece0 = GeometricPiece {
        length: positive_length(length0)?,
        alpha: alpha0,
        weight: weight0,
    };
    let piece1 = GeometricPiece {
        length: positive_length(length1)?,
        alpha: alpha1,
        weight: weight1,
    };

    let min_tick = if shift_mode.is_dynamic() {
        let (min_usable, max_usable) = usable_range(tick_spacing);
        let span = (piece0.length + piece1.length) as i32 * tick_spacing;
        dynamic_anchor(reference_tick, min_tick_or_offset, tick_spacing, min_usable, max_usable - span)
    } else {
        min_tick_or_offset
    };

    Ok(DoubleGeometricParams {
        tick_spacing,
        min_tick,
        piece0,
        piece1,
        shift_mode,
    })
}

/// Validate a packed double-geometric record
pub fn validate(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> CoreResult<()> {
    let shift_mode = validate_common(params, tick_spacing, twap_seconds_ago)?;
    let min_tick_or_offset = params.read_i24(1);
    let (length0, alpha0, weight0) = read_piece(params, 4);
    let (length1, alpha1, weight1) = read_piece(params, 14);

    validate_span(length0 as i64, tick_spacing)?;
    validate_span(length1 as i64, tick_spacing)?;
    let span = validate_span(length0 as i64 + length1 as i64, tick_spacing)?;
    validate_placement(min_tick_or_offset, span, shift_mode, tick_spacing)?;
    validate_alpha(alpha0)?;
    validate_alpha(alpha1)?;
    if weight0 == 0 || weight1 == 0 {
        return Err(LdfCoreError::invalid_params("weights must be non-zero"));
    }

    let total_weight = weight0 as u64 + weight1 as u64;
    validate_min_density(&geometric_segment(0, length0 as u32, alpha0)?.scaled(weight0 as u64, total_weight)?)?;
    validate_min_density(&geometric_segment(0, length1 as u32, alpha1)?.scaled(weight1 as u64, total_weight)?)
}

pub fn is_valid_params(params: &LdfParams, tick_spacing: i32, twap_seconds_ago: u32) -> bool {
    validate(params, tick_spacing, twap_seconds_ago).is_ok()
}

impl Distribution for DoubleGeometricParams {
    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn domain(&self) -> (i32, i32) {
        let length = self.piece0.length + self.piece1.length;
        (self.min_tick, self.min_tick + length as i32 * self.tick_spacing)
    }

    fn segments(&self) -> CoreResult<Vec<Segment>> {
        let total_weight = self.total_weight();
        let left = geometric_segment(self.min_tick, self.piece1.length, self.piece1.alpha)?
            .scaled(self.piece1.weight as u64, total_weight)?;
        let right = geometric_segment(self.junction_tick(), self.piece0.length, self.piece0.alpha)?
            .scaled(self.piece0.weight as u64, total_weight)?;
        Ok(vec![left, right])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q96;
    use crate::distributions::test_utils::*;
    use ethnum::U256;

    fn decoded(piece0: (i16, u32, u32), piece1: (i16, u32, u32)) -> DoubleGeometricParams {
        decode_params(&encode_params(ShiftMode::Static, -1_200, piece0, piece1), 0, 60).unwrap()
    }

    #[test]
    fn test_record_layout() {
        let params = encode_params(ShiftMode::Static, -1_200, (10, 80_000_000, 3), (12, 125_000_000, 1));
        assert_eq!(params.read_i16(4), 10);
        assert_eq!(params.read_u32(10), 3);
        assert_eq!(params.read_i16(14), 12);
        assert_eq!(params.read_u32(16), 125_000_000);
        assert_eq!(params.read_u32(20), 1);
        assert!(params.as_bytes()[24..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_pieces_meet_at_junction() {
        // mirror-image halves peaking on either side of the junction
        let dist = decoded((10, 50_000_000, 1), (10, 200_000_000, 1));
        let junction = dist.junction_tick();
        assert_eq!(junction, -600);

        let right_peak = dist.liquidity_density_x96(junction).unwrap();
        let left_peak = dist.liquidity_density_x96(junction - 60).unwrap();
        assert_eq!(right_peak, left_peak);
        // each half carries about half the mass: (1/2) * (1/2) / (1 - 2^-10)
        assert_eq!(right_peak, Q96 / U256::new(2) * U256::new(1_024) / U256::new(1_023) / U256::new(2));

        assert_eq!(dist.liquidity_density_x96(-1_260).unwrap(), U256::ZERO);
        assert_eq!(dist.liquidity_density_x96(0).unwrap(), U256::ZERO);
        assert!(dist.liquidity_density_x96(-1_200).unwrap() > U256::ZERO);
        assert!(dist.liquidity_density_x96(-60).unwrap() > U256::ZERO);
    }

    #[test]
    fn test_weights_split_mass() {
        let dist = decoded((10, 80_000_000, 3), (10, 125_000_000, 1));
        let junction = dist.junction_tick();
        let left_mass = dist.cumulative_left_x96(junction).unwrap();
        let right_mass = dist.cumulative_right_x96(junction - 60).unwrap();
        // 1 : 3 split within rounding
        let quarter = Q96 / U256::new(4);
        assert!(left_mass <= quarter && quarter - left_mass < U256::new(1_000));
        let three_quarters = Q96 - quarter;
        assert!(right_mass <= three_quarters && three_quarters - right_mass < U256::new(1_000));
    }

    #[test]
    fn test_normalized_and_consistent() {
        for (piece0, piece1) in [
            ((10, 80_000_000, 1), (10, 125_000_000, 1)),
            ((25, 90_000_000, 7), (5, 150_000_000, 2)),
            ((8, 120_000_000, 1), (12, 60_000_000, 5)),
        ] {
            let dist = decoded(piece0, piece1);
            assert_normalized(&dist);
            assert_cumulatives_consistent(&dist);
            assert_inverses_exact(&dist);
        }
    }

    #[test]
    fn test_validation() {
        let valid = encode_params(ShiftMode::Static, -1_200, (10, 80_000_000, 1), (10, 125_000_000, 1));
        assert!(is_valid_params(&valid, 60, 0));

        // zero weight
        let zero_weight = encode_params(ShiftMode::Static, -1_200, (10, 80_000_000, 0), (10, 125_000_000, 1));
        assert!(!is_valid_params(&zero_weight, 60, 0));
        // alpha == 1 on either piece
        let flat = encode_params(ShiftMode::Static, -1_200, (10, 100_000_000, 1), (10, 125_000_000, 1));
        assert!(!is_valid_params(&flat, 60, 0));
        // empty piece
        let empty = encode_params(ShiftMode::Static, -1_200, (0, 80_000_000, 1), (10, 125_000_000, 1));
        assert!(!is_valid_params(&empty, 60, 0));
        // a light piece drops below the density floor
        let thin = encode_params(ShiftMode::Static, -1_200, (10, 80_000_000, 1), (10, 125_000_000, 1_000));
        assert!(!is_valid_params(&thin, 60, 0));
        // misaligned anchor
        let misaligned = encode_params(ShiftMode::Static, -1_190, (10, 80_000_000, 1), (10, 125_000_000, 1));
        assert!(!is_valid_params(&misaligned, 60, 0));
    }

    #[test]
    fn test_dynamic_anchor() {
        let params = encode_params(ShiftMode::Both, -600, (10, 80_000_000, 1), (10, 125_000_000, 1));
        let dist = decode_params(&params, 30, 60).unwrap();
        assert_eq!(dist.min_tick, -600);
        assert_eq!(dist.domain(), (-600, 600));
        assert_eq!(dist.with_anchor(-60).domain(), (-60, 1_140));
    }
}

//! # LDF Types
//!
//! Packed parameter and state records plus the values returned by LDF
//! evaluations.
//!
//! Both records are 32 bytes with big-endian fields. The parameter record is
//! immutable per pool; the state record is rewritten whenever the anchor moves.

use std::fmt;

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{INITIALIZED_STATE, LDF_RECORD_BYTES};
use crate::errors::{CoreResult, LdfCoreError};

// ============================================================================
// Type Tags
// ============================================================================

/// Distribution family tag stored alongside the parameter record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LdfKind {
    Uniform = 0,
    Geometric = 1,
    DoubleGeometric = 2,
    DiscreteLaplace = 3,
    CarpetedGeometric = 4,
}

impl TryFrom<u8> for LdfKind {
    type Error = LdfCoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LdfKind::Uniform),
            1 => Ok(LdfKind::Geometric),
            2 => Ok(LdfKind::DoubleGeometric),
            3 => Ok(LdfKind::DiscreteLaplace),
            4 => Ok(LdfKind::CarpetedGeometric),
            other => Err(LdfCoreError::UnknownLdfKind(other)),
        }
    }
}

/// Policy constraining which way the anchor may move between evaluations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ShiftMode {
    /// Anchor follows the reference tick in both directions
    Both = 0,
    /// Anchor may only move to lower ticks
    Left = 1,
    /// Anchor may only move to higher ticks
    Right = 2,
    /// Anchor is read from the parameters and never moves
    Static = 3,
}

impl ShiftMode {
    /// Whether the anchor is derived from the reference tick
    pub fn is_dynamic(self) -> bool {
        self != ShiftMode::Static
    }
}

impl TryFrom<u8> for ShiftMode {
    type Error = LdfCoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ShiftMode::Both),
            1 => Ok(ShiftMode::Left),
            2 => Ok(ShiftMode::Right),
            3 => Ok(ShiftMode::Static),
            other => Err(LdfCoreError::InvalidShiftMode(other)),
        }
    }
}

// ============================================================================
// Parameter Record
// ============================================================================

/// Packed 32-byte distribution parameters
///
/// Serialized as a `0x`-prefixed hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LdfParams([u8; LDF_RECORD_BYTES]);

impl LdfParams {
    pub const fn new(bytes: [u8; LDF_RECORD_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; LDF_RECORD_BYTES] {
        &self.0
    }

    /// Parse a hex record, with or without `0x`. Shorter inputs are padded
    /// with trailing zero bytes.
    pub fn from_hex(input: &str) -> CoreResult<Self> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let decoded = hex::decode(digits)
            .map_err(|e| LdfCoreError::config(format!("invalid ldf params hex: {}", e)))?;
        if decoded.len() > LDF_RECORD_BYTES {
            return Err(LdfCoreError::config(format!(
                "ldf params are {} bytes, expected at most {}",
                decoded.len(),
                LDF_RECORD_BYTES
            )));
        }
        let mut bytes = [0u8; LDF_RECORD_BYTES];
        bytes[..decoded.len()].copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Shift mode stored in the first byte
    pub fn shift_mode(&self) -> CoreResult<ShiftMode> {
        ShiftMode::try_from(self.0[0])
    }

    pub fn read_u8(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    /// Signed 24-bit big-endian field
    pub fn read_i24(&self, offset: usize) -> i32 {
        let raw = i32::from_be_bytes([self.0[offset], self.0[offset + 1], self.0[offset + 2], 0]);
        raw >> 8
    }

    pub fn read_i16(&self, offset: usize) -> i16 {
        i16::from_be_bytes([self.0[offset], self.0[offset + 1]])
    }

    pub fn read_u32(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.0[offset],
            self.0[offset + 1],
            self.0[offset + 2],
            self.0[offset + 3],
        ])
    }
}

impl fmt::Debug for LdfParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LdfParams").field(&self.to_hex()).finish()
    }
}

impl TryFrom<String> for LdfParams {
    type Error = LdfCoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<LdfParams> for String {
    fn from(params: LdfParams) -> Self {
        params.to_hex()
    }
}

/// Sequential big-endian writer producing a parameter record
#[derive(Debug, Clone, Default)]
pub struct LdfParamsWriter {
    bytes: [u8; LDF_RECORD_BYTES],
    cursor: usize,
}

impl LdfParamsWriter {
    pub fn new(shift_mode: ShiftMode) -> Self {
        Self::default().u8(shift_mode as u8)
    }

    fn put(mut self, field: &[u8]) -> Self {
        let end = (self.cursor + field.len()).min(LDF_RECORD_BYTES);
        let len = end - self.cursor;
        self.bytes[self.cursor..end].copy_from_slice(&field[..len]);
        self.cursor = end;
        self
    }

    pub fn u8(self, value: u8) -> Self {
        self.put(&[value])
    }

    /// Low 24 bits of `value`, big-endian
    pub fn i24(self, value: i32) -> Self {
        let bytes = value.to_be_bytes();
        self.put(&bytes[1..])
    }

    pub fn i16(self, value: i16) -> Self {
        self.put(&value.to_be_bytes())
    }

    pub fn u32(self, value: u32) -> Self {
        self.put(&value.to_be_bytes())
    }

    pub fn finish(self) -> LdfParams {
        LdfParams(self.bytes)
    }
}

// ============================================================================
// Persisted State
// ============================================================================

/// Per-pool state of a dynamic distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LdfState {
    pub initialized: bool,
    pub last_anchor: i32,
}

impl LdfState {
    /// State recording `anchor` as the last resolved anchor
    pub fn with_anchor(anchor: i32) -> Self {
        Self {
            initialized: true,
            last_anchor: anchor,
        }
    }

    /// Decode a 32-byte state record: initialized flag, then a 24-bit anchor
    pub fn decode(bytes: &[u8; LDF_RECORD_BYTES]) -> Self {
        if bytes[0] != INITIALIZED_STATE {
            return Self::default();
        }
        let raw = i32::from_be_bytes([bytes[1], bytes[2], bytes[3], 0]);
        Self::with_anchor(raw >> 8)
    }

    pub fn encode(&self) -> [u8; LDF_RECORD_BYTES] {
        let mut bytes = [0u8; LDF_RECORD_BYTES];
        if self.initialized {
            bytes[0] = INITIALIZED_STATE;
            bytes[1..4].copy_from_slice(&self.last_anchor.to_be_bytes()[1..]);
        }
        bytes
    }
}

// ============================================================================
// Evaluation Results
// ============================================================================

/// Result of evaluating an LDF at one rounded tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdfQuery {
    /// Density of the rounded tick
    pub liquidity_density_x96: U256,
    /// Density strictly right of the rounded tick
    pub cumulative_right_x96: U256,
    /// Density strictly left of the rounded tick
    pub cumulative_left_x96: U256,
    /// Token0 per Q96 liquidity held by ticks right of the rounded tick
    pub cumulative_amount0_density_x96: U256,
    /// Token1 per Q96 liquidity held by ticks left of the rounded tick
    pub cumulative_amount1_density_x96: U256,
    pub new_state: LdfState,
    pub should_surge: bool,
}

/// Tick and boundary amounts found by inverting a cumulative amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LdfSwap {
    pub success: bool,
    pub rounded_tick: i32,
    /// Token0 held at the boundary the partial step starts from
    pub cumulative_amount0: U256,
    /// Token1 held at the boundary the partial step starts from
    pub cumulative_amount1: U256,
    /// Liquidity of the rounded tick
    pub swap_liquidity: u128,
}

impl LdfSwap {
    pub fn failed() -> Self {
        Self::default()
    }
}

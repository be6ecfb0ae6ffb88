//! # Protocol Constants
//!
//! Fundamental constants for the LDF engine including:
//! - Mathematical constants (Q96, WAD)
//! - Tick and sqrt price bounds
//! - Distribution parameter bounds

use ethnum::U256;

// ============================================================================
// Mathematical Constants
// ============================================================================

/// Q96 fixed-point scale factor: 2^96
pub const Q96: U256 = U256::new(1u128 << 96);

/// Q96 as a plain u128
pub const Q96_U128: u128 = 1u128 << 96;

/// WAD scale factor: 1e18
pub const WAD: i128 = 1_000_000_000_000_000_000;

/// ln(2) in WAD
pub const LN2_WAD: i128 = 693_147_180_559_945_309;

/// Resolution used before rounding inverted tick indices: 1e-6 in WAD
pub const INDEX_ROUNDING_RESOLUTION_WAD: i128 = 1_000_000_000_000;

// ============================================================================
// Tick Constants
// ============================================================================

/// Minimum tick
pub const MIN_TICK: i32 = -887_272;

/// Maximum tick
pub const MAX_TICK: i32 = 887_272;

/// Minimum tick spacing
pub const MIN_TICK_SPACING: i32 = 1;

/// Maximum tick spacing
pub const MAX_TICK_SPACING: i32 = 32_767;

/// Largest value representable by a packed signed 24-bit tick
pub const MAX_INT24: i32 = (1 << 23) - 1;

/// Minimum sqrt price in Q96 format (sqrt price at MIN_TICK)
pub const MIN_SQRT_PRICE: U256 = U256::new(4_295_128_739);

/// Maximum sqrt price in Q96 format (sqrt price at MAX_TICK)
pub const MAX_SQRT_PRICE: U256 =
    U256::from_words(4_294_805_859, 318_775_800_626_314_356_294_205_765_087_544_249_638);

// ============================================================================
// Distribution Parameter Constants
// ============================================================================

/// Alpha values are stored with 8 decimals
pub const ALPHA_BASE: u32 = 100_000_000;

/// Minimum alpha (0.00001)
pub const MIN_ALPHA: u32 = 1_000;

/// Maximum alpha (12.0)
pub const MAX_ALPHA: u32 = 1_200_000_000;

/// Carpet weights are stored with 9 decimals
pub const WEIGHT_BASE: u32 = 1_000_000_000;

/// Minimum density any tick of a bounded geometric family may carry (0.1%)
pub const MIN_LIQUIDITY_DENSITY_X96: U256 = U256::new((1u128 << 96) / 1_000);

/// Size of the packed parameter and state records
pub const LDF_RECORD_BYTES: usize = 32;

/// Initialized marker stored in the first state byte
pub const INITIALIZED_STATE: u8 = 1;

//! # Core Error Types
//!
//! Errors shared by the math primitives, the distribution libraries, the LDF
//! facade and the swap engine.
//!
//! Domain conditions (a target above the available mass, a failed inversion)
//! are never errors: they surface as `Option`/`success` values so callers can
//! apply their boundary policy. Everything here is either a malformed input or
//! an arithmetic fault that valid parameters rule out by construction.

use thiserror::Error;

/// Core errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LdfCoreError {
    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Mul div overflow")]
    MulDivOverflow,

    #[error("Invalid logarithm input")]
    InvalidLogarithmInput,

    #[error("Conversion error")]
    ConversionError,

    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Invalid tick: {0}")]
    InvalidTick(i32),

    #[error("Invalid tick spacing: {0}")]
    InvalidTickSpacing(i32),

    #[error("Invalid sqrt price")]
    InvalidSqrtPrice,

    #[error("Invalid shift mode: {0}")]
    InvalidShiftMode(u8),

    #[error("Unknown LDF kind: {0}")]
    UnknownLdfKind(u8),

    #[error("Invalid LDF params: {0}")]
    InvalidParams(&'static str),

    // ========================================================================
    // Swap Errors
    // ========================================================================

    #[error("Invalid price limit")]
    InvalidPriceLimit,

    #[error("Zero swap amount")]
    ZeroAmount,

    #[error("Price moved against swap direction")]
    PriceMovedAgainstDirection,

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, LdfCoreError>;

impl LdfCoreError {
    /// Create a configuration error with reason
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Create an invalid params error with reason
    pub fn invalid_params(reason: &'static str) -> Self {
        Self::InvalidParams(reason)
    }
}

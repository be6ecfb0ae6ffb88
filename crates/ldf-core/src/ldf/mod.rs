//! # LDF
//!
//! Anchor resolution against persisted state and the facade that dispatches
//! every evaluation to the configured distribution family.

pub mod facade;
pub mod shift;

pub use facade::{DecodedParams, LdfContext, LiquidityDensityFunction, ResolvedLdf};
pub use shift::{enforce_shift_mode, resolve_anchor, AnchorResolution};

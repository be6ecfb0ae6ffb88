//! # Core Type Definitions
//!
//! Value types shared by the distributions, the LDF facade and the swap engine.

pub mod ldf;
pub mod swap;

// Re-export all types
pub use ldf::*;
pub use swap::*;

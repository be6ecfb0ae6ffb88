//! # Shift Mode Resolution
//!
//! Dynamic distributions recompute their anchor from the reference tick on
//! every evaluation. The shift mode limits which way that anchor may move
//! relative to the one stored in the pool's LDF state; any movement is
//! reported as a surge.

use serde::{Deserialize, Serialize};

use crate::types::{LdfState, ShiftMode};

/// Anchor chosen for an evaluation and the state to persist afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorResolution {
    pub anchor: i32,
    pub new_state: LdfState,
    /// The anchor differs from the stored one
    pub should_surge: bool,
}

/// Apply the shift mode to a freshly decoded anchor
pub fn enforce_shift_mode(anchor: i32, last_anchor: i32, shift_mode: ShiftMode) -> i32 {
    match shift_mode {
        ShiftMode::Both => anchor,
        ShiftMode::Left => anchor.min(last_anchor),
        ShiftMode::Right => anchor.max(last_anchor),
        ShiftMode::Static => last_anchor,
    }
}

/// Resolve the anchor against persisted state
///
/// Uninitialized state accepts the decoded anchor and never surges.
pub fn resolve_anchor(anchor: i32, shift_mode: ShiftMode, state: LdfState) -> AnchorResolution {
    if !state.initialized {
        return AnchorResolution {
            anchor,
            new_state: LdfState::with_anchor(anchor),
            should_surge: false,
        };
    }

    let resolved = enforce_shift_mode(anchor, state.last_anchor, shift_mode);
    AnchorResolution {
        anchor: resolved,
        new_state: LdfState::with_anchor(resolved),
        should_surge: resolved != state.last_anchor,
    }
}

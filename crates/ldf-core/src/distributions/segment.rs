//! # Geometric Segments
//!
//! Every distribution family is laid out as an ordered list of disjoint
//! segments. A segment is a run of rounded ticks whose density decays
//! geometrically away from one of its ends:
//!
//! ```text
//! density(i) = peak * decay^d(i)      d = distance from the peak end, decay <= 1
//! ```
//!
//! Summing density, or the token amounts that density holds, over any run of
//! ticks is then a geometric series. Each series is anchored at its largest
//! term so that only ratios `<= 1` are ever raised to a power:
//!
//! | weighting | per-tick term                   | ratio moving right |
//! |-----------|---------------------------------|--------------------|
//! | density   | `D(t)`                          | `decay^±1`         |
//! | amount0   | `D(t) (1/sqrtP(t) - 1/sqrtP(t+s))` | `decay^±1 / r`  |
//! | amount1   | `D(t) (sqrtP(t+s) - sqrtP(t))`  | `decay^±1 * r`     |
//!
//! with `r = sqrtP(s)`. Inversion isolates the exponent with a logarithm, then
//! checks the result against the forward sum.

use ethnum::U256;
use tracing::debug;

use crate::constants::Q96;
use crate::distributions::Side;
use crate::errors::CoreResult;
use crate::math::big_int::{mul_div, to_u128, Rounding};
use crate::math::fixed_point::{ln_ratio_wad, mul_q96, rpow_q96, x_wad_to_index};
use crate::math::liquidity_math::{get_amount0_delta, get_amount1_delta};
use crate::math::tick_math::get_sqrt_price_at_tick;

/// Steps the closed-form estimate may be nudged before falling back to bisection
const MAX_CORRECTION_STEPS: u32 = 3;

/// Quantity summed over ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    /// Share of total liquidity
    Density,
    /// Token0 held per Q96 units of liquidity when the price is below the tick
    Amount0,
    /// Token1 held per Q96 units of liquidity when the price is above the tick
    Amount1,
}

/// Run of rounded ticks with geometrically decaying density
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// First rounded tick of the run
    pub start_tick: i32,
    /// Number of rounded ticks
    pub length: u32,
    /// Density of the tick at the peak end
    pub peak_x96: U256,
    /// Per-tick decay away from the peak end, at most Q96
    pub decay_x96: U256,
    /// End of the run holding the peak
    pub peak: Side,
}

impl Segment {
    /// Run with the same density on every tick
    pub fn uniform(start_tick: i32, length: u32, density_x96: U256) -> Self {
        Self {
            start_tick,
            length,
            peak_x96: density_x96,
            decay_x96: Q96,
            peak: Side::Left,
        }
    }

    /// Exclusive end tick
    pub fn end_tick(&self, tick_spacing: i32) -> i32 {
        self.start_tick + self.length as i32 * tick_spacing
    }

    /// Scale every density of the run by `numerator / denominator`
    pub fn scaled(self, numerator: u64, denominator: u64) -> CoreResult<Self> {
        Ok(Self {
            peak_x96: mul_div(
                self.peak_x96,
                U256::from(numerator),
                U256::from(denominator),
                Rounding::Down,
            )?,
            ..self
        })
    }

    fn tick_at(&self, index: u32, tick_spacing: i32) -> i32 {
        self.start_tick + index as i32 * tick_spacing
    }

    fn index_of(&self, tick: i32, tick_spacing: i32) -> Option<u32> {
        if tick < self.start_tick || tick >= self.end_tick(tick_spacing) {
            return None;
        }
        Some(((tick - self.start_tick) / tick_spacing) as u32)
    }

    /// Density of the tick `index` steps from the start
    pub fn density_at_index(&self, index: u32) -> CoreResult<U256> {
        let distance = match self.peak {
            Side::Left => index,
            Side::Right => self.length - 1 - index,
        };
        if distance == 0 || self.decay_x96 == Q96 {
            return Ok(self.peak_x96);
        }
        mul_q96(self.peak_x96, rpow_q96(self.decay_x96, distance)?, Rounding::Down)
    }

    /// Density of the tick furthest from the peak
    pub fn min_density_x96(&self) -> CoreResult<U256> {
        match self.peak {
            Side::Left => self.density_at_index(self.length - 1),
            Side::Right => self.density_at_index(0),
        }
    }

    /// Density at a rounded tick, zero outside the run
    pub fn density_x96(&self, tick: i32, tick_spacing: i32) -> CoreResult<U256> {
        match self.index_of(tick, tick_spacing) {
            Some(index) => self.density_at_index(index),
            None => Ok(U256::ZERO),
        }
    }

    fn amount_term(&self, weighting: Weighting, index: u32, tick_spacing: i32) -> CoreResult<U256> {
        let density = to_u128(self.density_at_index(index)?)?;
        let tick = self.tick_at(index, tick_spacing);
        let sqrt_price_lower = get_sqrt_price_at_tick(tick)?;
        let sqrt_price_upper = get_sqrt_price_at_tick(tick + tick_spacing)?;
        match weighting {
            Weighting::Amount0 => {
                get_amount0_delta(sqrt_price_lower, sqrt_price_upper, density, false)
            }
            Weighting::Amount1 => {
                get_amount1_delta(sqrt_price_lower, sqrt_price_upper, density, false)
            }
            Weighting::Density => Ok(U256::from(density)),
        }
    }

    /// Series of per-tick terms for `weighting`, anchored at its largest term
    pub(crate) fn series(&self, weighting: Weighting, tick_spacing: i32) -> CoreResult<Series> {
        if self.length == 0 {
            return Ok(Series {
                anchor: Side::Left,
                first: U256::ZERO,
                ratio: Q96,
                length: 0,
            });
        }
        let decay = self.decay_x96;

        let (anchor, ratio) = match weighting {
            Weighting::Density => (self.peak, decay),
            Weighting::Amount0 | Weighting::Amount1 => {
                let r = get_sqrt_price_at_tick(tick_spacing)?;
                let decay_times_r = mul_div(decay, r, Q96, Rounding::Down)?;
                let decay_over_r = mul_div(decay, Q96, r, Rounding::Down)?;
                match (weighting, self.peak) {
                    (Weighting::Amount0, Side::Left) => (Side::Left, decay_over_r),
                    (Weighting::Amount0, _) if decay_times_r >= Q96 => {
                        (Side::Left, mul_div(Q96, Q96, decay_times_r, Rounding::Down)?)
                    }
                    (Weighting::Amount0, _) => (Side::Right, decay_times_r),
                    (_, Side::Right) => (Side::Right, decay_over_r),
                    (_, _) if decay_times_r <= Q96 => (Side::Left, decay_times_r),
                    (_, _) => (Side::Right, mul_div(Q96, Q96, decay_times_r, Rounding::Down)?),
                }
            }
        };

        let anchor_index = match anchor {
            Side::Left => 0,
            Side::Right => self.length - 1,
        };
        let first = match weighting {
            Weighting::Density => self.density_at_index(anchor_index)?,
            _ => self.amount_term(weighting, anchor_index, tick_spacing)?,
        };

        Ok(Series {
            anchor,
            first,
            ratio,
            length: self.length,
        })
    }
}

// ============================================================================
// Series
// ============================================================================

/// Geometric series `first * ratio^k`, `k` counted from the anchor end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Series {
    anchor: Side,
    first: U256,
    ratio: U256,
    length: u32,
}

impl Series {
    /// Sum of the terms at offsets `[from, to)` from the anchor
    fn sum_from_anchor(&self, from: u32, to: u32) -> CoreResult<U256> {
        if from >= to || self.first == U256::ZERO {
            return Ok(U256::ZERO);
        }
        if self.ratio == Q96 {
            return Ok(self.first * U256::from(to - from));
        }
        let high = rpow_q96(self.ratio, from)?;
        let low = rpow_q96(self.ratio, to)?;
        mul_div(
            self.first,
            high.saturating_sub(low),
            Q96 - self.ratio,
            Rounding::Down,
        )
    }

    /// Sum over segment indices `[start, end)`
    pub fn range_sum(&self, start: u32, end: u32) -> CoreResult<U256> {
        match self.anchor {
            Side::Left => self.sum_from_anchor(start, end),
            Side::Right => {
                self.sum_from_anchor(self.length.saturating_sub(end), self.length.saturating_sub(start))
            }
        }
    }

    pub fn total(&self) -> CoreResult<U256> {
        self.sum_from_anchor(0, self.length)
    }

    /// Largest index whose terms from itself to the end sum to at least `target`
    pub fn inverse_suffix(&self, target: U256) -> CoreResult<Option<u32>> {
        if self.length == 0 {
            return Ok(None);
        }
        if target == U256::ZERO {
            return Ok(Some(self.length - 1));
        }
        if target > self.total()? {
            return Ok(None);
        }
        let index = match self.anchor {
            Side::Left => self.last_tail_reaching(target)?,
            Side::Right => self.length - self.first_head_reaching(target)?,
        };
        Ok(Some(index))
    }

    /// Smallest index whose terms from the start to itself sum to at least `target`
    pub fn inverse_prefix(&self, target: U256) -> CoreResult<Option<u32>> {
        if self.length == 0 {
            return Ok(None);
        }
        if target == U256::ZERO {
            return Ok(Some(0));
        }
        if target > self.total()? {
            return Ok(None);
        }
        let index = match self.anchor {
            Side::Left => self.first_head_reaching(target)? - 1,
            Side::Right => self.length - 1 - self.last_tail_reaching(target)?,
        };
        Ok(Some(index))
    }

    /// Smallest `k` in `[1, length]` with `sum_from_anchor(0, k) >= target`
    fn first_head_reaching(&self, target: U256) -> CoreResult<u32> {
        refine_first_true(self.first_head_estimate(target)?, 1, self.length, |k| {
            Ok(self.sum_from_anchor(0, k)? >= target)
        })
    }

    /// Closed-form estimate for [`Self::first_head_reaching`]
    ///
    /// `first (1 - q^k) / (1 - q) >= target`  <=>  `k >= ln(y) / ln(q)`,
    /// `y = 1 - target (1 - q) / first`
    fn first_head_estimate(&self, target: U256) -> CoreResult<u32> {
        if self.ratio == Q96 {
            Ok(ceil_div_index(target, self.first))
        } else if self.ratio == U256::ZERO {
            Ok(1)
        } else {
            let drop = mul_div(target, Q96 - self.ratio, self.first, Rounding::Up)?;
            log_index(Q96.saturating_sub(drop), self.ratio, true)
        }
    }

    /// Largest `j` in `[0, length - 1]` with `sum_from_anchor(j, length) >= target`
    fn last_tail_reaching(&self, target: U256) -> CoreResult<u32> {
        // First index whose tail falls short, minus one
        let guess = self.last_tail_estimate(target)?.saturating_add(1);
        let first_short = refine_first_true(guess, 1, self.length, |j| {
            Ok(self.sum_from_anchor(j, self.length)? < target)
        })?;
        Ok(first_short - 1)
    }

    /// Closed-form estimate for [`Self::last_tail_reaching`]
    ///
    /// `first (q^j - q^n) / (1 - q) >= target`  <=>  `j <= ln(y) / ln(q)`,
    /// `y = target (1 - q) / first + q^n`
    fn last_tail_estimate(&self, target: U256) -> CoreResult<u32> {
        if self.ratio == Q96 {
            Ok(self.length.saturating_sub(ceil_div_index(target, self.first)))
        } else if self.ratio == U256::ZERO {
            Ok(0)
        } else {
            let rise = mul_div(target, Q96 - self.ratio, self.first, Rounding::Down)?;
            let y = rise.saturating_add(rpow_q96(self.ratio, self.length)?);
            log_index(y, self.ratio, false)
        }
    }
}

/// `ceil(numerator / denominator)` as an index, saturating
fn ceil_div_index(numerator: U256, denominator: U256) -> u32 {
    if denominator == U256::ZERO {
        return u32::MAX;
    }
    let quotient = numerator / denominator
        + if numerator % denominator == U256::ZERO {
            U256::ZERO
        } else {
            U256::ONE
        };
    to_u128(quotient)
        .ok()
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(u32::MAX)
}

/// `ln(y) / ln(q)` rounded to an index, for `q` in `(0, Q96)`
fn log_index(y: U256, q: U256, round_up: bool) -> CoreResult<u32> {
    if y >= Q96 {
        return Ok(0);
    }
    if y == U256::ZERO {
        return Ok(u32::MAX);
    }
    let index = x_wad_to_index(ln_ratio_wad(y, q)?, round_up);
    Ok(index.clamp(0, u32::MAX as i64) as u32)
}

/// Smallest index in `[low, high]` satisfying a monotone predicate
///
/// The closed-form estimate is exact up to the `1e-6` rounding of the
/// exponent, so it lands within [`MAX_CORRECTION_STEPS`] of the answer.
/// Bisection only runs if that bound is broken and is logged when it does.
fn refine_first_true<F>(guess: u32, low: u32, high: u32, predicate: F) -> CoreResult<u32>
where
    F: Fn(u32) -> CoreResult<bool>,
{
    if let Some(index) = correct_estimate(guess, low, high, &predicate)? {
        return Ok(index);
    }
    debug!(guess, low, high, "closed-form inverse estimate out of range, bisecting");

    let (mut lo, mut hi) = (low, high);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if predicate(mid)? {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok(lo)
}

/// Walk `guess` at most [`MAX_CORRECTION_STEPS`] toward the first index
/// satisfying `predicate`. Returns `high` when nothing matches, `None` when
/// the steps run out.
fn correct_estimate<F>(guess: u32, low: u32, high: u32, predicate: &F) -> CoreResult<Option<u32>>
where
    F: Fn(u32) -> CoreResult<bool>,
{
    let mut index = guess.clamp(low, high);
    for _ in 0..MAX_CORRECTION_STEPS {
        if !predicate(index)? {
            if index == high {
                return Ok(Some(high));
            }
            index += 1;
        } else if index > low && predicate(index - 1)? {
            index -= 1;
        } else {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

// ============================================================================
// Segment Lists
// ============================================================================

/// Density at a rounded tick across all segments
pub fn density_x96(segments: &[Segment], tick: i32, tick_spacing: i32) -> CoreResult<U256> {
    for segment in segments {
        if let Some(index) = segment.index_of(tick, tick_spacing) {
            return segment.density_at_index(index);
        }
    }
    Ok(U256::ZERO)
}

/// Sum of `weighting` over every tick
pub fn total(segments: &[Segment], weighting: Weighting, tick_spacing: i32) -> CoreResult<U256> {
    segments.iter().try_fold(U256::ZERO, |acc, segment| {
        Ok(acc + segment.series(weighting, tick_spacing)?.total()?)
    })
}

/// Sum of `weighting` over ticks `>= tick`
pub fn sum_at_or_above(
    segments: &[Segment],
    weighting: Weighting,
    tick: i32,
    tick_spacing: i32,
) -> CoreResult<U256> {
    let mut sum = U256::ZERO;
    for segment in segments {
        if segment.end_tick(tick_spacing) <= tick {
            continue;
        }
        let start = if tick <= segment.start_tick {
            0
        } else {
            ((tick - segment.start_tick) / tick_spacing) as u32
        };
        sum += segment
            .series(weighting, tick_spacing)?
            .range_sum(start, segment.length)?;
    }
    Ok(sum)
}

/// Sum of `weighting` over ticks `<= tick`
pub fn sum_at_or_below(
    segments: &[Segment],
    weighting: Weighting,
    tick: i32,
    tick_spacing: i32,
) -> CoreResult<U256> {
    let mut sum = U256::ZERO;
    for segment in segments {
        if segment.start_tick > tick {
            continue;
        }
        let end = if tick >= segment.end_tick(tick_spacing) - tick_spacing {
            segment.length
        } else {
            ((tick - segment.start_tick) / tick_spacing) as u32 + 1
        };
        sum += segment.series(weighting, tick_spacing)?.range_sum(0, end)?;
    }
    Ok(sum)
}

/// Largest tick `t` with `sum_at_or_above(t) >= target`, `None` above the total
pub fn inverse_at_or_above(
    segments: &[Segment],
    weighting: Weighting,
    target: U256,
    tick_spacing: i32,
) -> CoreResult<Option<i32>> {
    let mut accumulated = U256::ZERO;
    for segment in segments.iter().rev() {
        let series = segment.series(weighting, tick_spacing)?;
        let segment_total = series.total()?;
        let remaining = target - accumulated;
        if segment_total >= remaining {
            return Ok(series
                .inverse_suffix(remaining)?
                .map(|index| segment.tick_at(index, tick_spacing)));
        }
        accumulated += segment_total;
    }
    Ok(None)
}

/// Smallest tick `t` with `sum_at_or_below(t) >= target`, `None` above the total
pub fn inverse_at_or_below(
    segments: &[Segment],
    weighting: Weighting,
    target: U256,
    tick_spacing: i32,
) -> CoreResult<Option<i32>> {
    let mut accumulated = U256::ZERO;
    for segment in segments {
        let series = segment.series(weighting, tick_spacing)?;
        let segment_total = series.total()?;
        let remaining = target - accumulated;
        if segment_total >= remaining {
            return Ok(series
                .inverse_prefix(remaining)?
                .map(|index| segment.tick_at(index, tick_spacing)));
        }
        accumulated += segment_total;
    }
    Ok(None)
}

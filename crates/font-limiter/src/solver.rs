//! Tent rebasing.
//!
//! Given a tent `(lower, peak, upper)` over the current normalized axis range
//! and a new [`AxisLimit`], [`rebase_tent`] finds a list of `(scalar, tent)`
//! pairs over the new range whose weighted sum reproduces the original tent
//! everywhere the new range can reach. A single triangle cut by the new limit
//! generally is not a triangle any more, so the result can hold several
//! pieces.
//!
//! The returned tents are already expressed in the new range's normalized
//! coordinates. A tent with a zero peak is always fully active.

use std::collections::{HashMap, hash_map::Entry};

use log::trace;

use crate::{
    limits::AxisLimit,
    model::{MAX_F2DOT14, Tent, normalize_value},
};

/// Weighted tents produced by [`rebase_tent`]. Never contains a zero scalar.
pub type Decomposition = Vec<(f64, Tent)>;

/// One F2Dot14 unit; used to move a peak off the axis default.
const EPSILON: f64 = 1.0 / (1 << 14) as f64;

/// Rebase `tent` onto the range described by `axis_limit`.
///
/// # Panics
///
/// Panics if `axis_limit` is not `-1 <= min <= default <= max <= 1`, if the
/// tent is not `-2 <= lower <= peak <= upper <= 2`, or if its peak is zero.
pub fn rebase_tent(tent: Tent, axis_limit: AxisLimit) -> Decomposition {
    assert!(axis_limit.is_valid(), "invalid axis limit {axis_limit:?}");
    assert!(
        -2.0 <= tent.lower
            && tent.lower <= tent.peak
            && tent.peak <= tent.upper
            && tent.upper <= 2.0,
        "invalid tent {tent:?}"
    );
    assert!(tent.peak != 0.0, "tent peak must not be zero");

    let n = |v: f64| normalize_value(v, &axis_limit, true);

    solve_general(tent, axis_limit)
        .into_iter()
        .filter(|(scalar, _)| *scalar != 0.0)
        .map(|(scalar, t)| (scalar, Tent::new(n(t.lower), n(t.peak), n(t.upper))))
        .collect()
}

fn solve_general(tent: Tent, axis_limit: AxisLimit) -> Decomposition {
    let axis_def = axis_limit.default;
    let axis_max = axis_limit.maximum;
    let Tent { lower, peak, .. } = tent;

    // Mirror the problem such that axis_def <= peak
    if axis_def > peak {
        return solve_general(tent.reverse_negate(), axis_limit.reverse_negate())
            .into_iter()
            .map(|(scalar, t)| (scalar, t.reverse_negate()))
            .collect();
    }

    // The whole tent lies beyond the new maximum
    if axis_max <= lower && axis_max < peak {
        return Vec::new();
    }

    // The new maximum cuts the rising slope: flatten the tent at axis_max and
    // scale by its value there
    if axis_max < peak {
        let mult = tent.value_at(axis_max);
        let cut = Tent::new(lower, axis_max, axis_max);
        return solve_general(cut, axis_limit)
            .into_iter()
            .map(|(scalar, t)| (scalar * mult, t))
            .collect();
    }

    // axis_def <= peak <= axis_max
    if axis_def <= lower && axis_def < peak {
        solve_without_gain(tent, axis_limit)
    } else {
        solve_with_gain(tent, axis_limit)
    }
}

/// axis_min <= axis_def <= lower < peak <= axis_max
fn solve_without_gain(tent: Tent, axis_limit: AxisLimit) -> Decomposition {
    let axis_def = axis_limit.default;
    let axis_max = axis_limit.maximum;
    let Tent { lower, peak, mut upper } = tent;

    // The far side still fits within twice the new positive range; only
    // rescale. +2.0 is not representable in F2Dot14, so clamp to the largest
    // value that is.
    if axis_def + (axis_max - axis_def) * 2.0 >= upper {
        if axis_def + (axis_max - axis_def) * MAX_F2DOT14 < upper {
            upper = axis_def + (axis_max - axis_def) * MAX_F2DOT14;
        }
        return vec![(1.0, Tent::new(lower, peak, upper))];
    }

    // A triangle with its far side cut off is the sum of two triangles
    let mut out = vec![(1.0, Tent::new(lower, peak, axis_max))];
    if peak < axis_max {
        out.push((tent.value_at(axis_max), Tent::new(peak, axis_max, axis_max)));
    }
    out
}

/// lower <= axis_def <= peak <= axis_max, with a non-zero value at axis_def
fn solve_with_gain(tent: Tent, axis_limit: AxisLimit) -> Decomposition {
    let AxisLimit { minimum: axis_min, default: axis_def, maximum: axis_max } = axis_limit;
    let Tent { mut lower, peak, mut upper } = tent;

    let gain = tent.value_at(axis_def);
    let mut out = vec![(gain, Tent::new(axis_min, axis_def, axis_max))];

    // Positive side
    let out_gain = tent.value_at(axis_max);

    if gain > out_gain {
        // The falling slope drops below `gain` before axis_max: ramp up from
        // the default to the peak, down to the crossing, then cancel the
        // baseline.
        let crossing = peak + (1.0 - gain) * (upper - peak);
        out.push((1.0 - gain, Tent::new(axis_def, peak, crossing)));

        if upper >= axis_max {
            out.push((out_gain - gain, Tent::new(crossing, axis_max, axis_max)));
        } else {
            // With peak == upper the original is 1 at the peak and 0 right
            // past it. Continuous tents cannot follow that step, so the sum
            // is 1 - gain at exactly the peak.
            // A peak must not sit on the default
            if upper == axis_def {
                upper += EPSILON;
            }
            out.push((-gain, Tent::new(crossing, upper, axis_max)));
            out.push((-gain, Tent::new(upper, axis_max, axis_max)));
        }
    } else {
        // Stretch the falling slope so that, stacked on the baseline, it
        // follows the original slope
        let new_upper = peak + (1.0 - gain) * (upper - peak);

        if axis_def + (axis_max - axis_def) * 2.0 >= new_upper {
            upper = new_upper;
            if axis_def + (axis_max - axis_def) * MAX_F2DOT14 < upper {
                upper = axis_def + (axis_max - axis_def) * MAX_F2DOT14;
            }
            if upper > axis_def {
                out.push((1.0 - gain, Tent::new(axis_def, peak, upper)));
            }
        } else {
            out.push((1.0 - gain, Tent::new(axis_def, peak, axis_max)));
            if peak < axis_max {
                out.push((out_gain - gain, Tent::new(peak, axis_max, axis_max)));
            }
        }
    }

    // Negative side
    if lower <= axis_min {
        let scalar = tent.value_at(axis_min);
        out.push((scalar - gain, Tent::new(axis_min, axis_min, axis_def)));
    } else {
        // A peak must not sit on the default
        if lower == axis_def {
            lower -= EPSILON;
        }
        // Cancel the baseline below `lower`, split there
        out.push((-gain, Tent::new(axis_min, lower, axis_def)));
        out.push((-gain, Tent::new(axis_min, axis_min, lower)));
    }

    out
}

/// Cache key built from the exact bit patterns of the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey([u64; 6]);

impl CacheKey {
    fn new(tent: &Tent, limit: &AxisLimit) -> Self {
        Self([
            key_bits(tent.lower),
            key_bits(tent.peak),
            key_bits(tent.upper),
            key_bits(limit.minimum),
            key_bits(limit.default),
            key_bits(limit.maximum),
        ])
    }
}

// -0.0 and 0.0 compare equal, so they share a key
fn key_bits(v: f64) -> u64 {
    if v == 0.0 { 0 } else { v.to_bits() }
}

/// Memoizing front end for [`rebase_tent`].
///
/// The same (tent, limit) pair recurs across every deltaset that shares an
/// axis restriction. Keep one solver per instancing run.
#[derive(Debug, Default)]
pub struct TentSolver {
    cache: HashMap<CacheKey, Decomposition>,
    hits: usize,
    misses: usize,
}

impl TentSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`rebase_tent`], answering repeated inputs from the cache.
    pub fn rebase(&mut self, tent: Tent, axis_limit: AxisLimit) -> Decomposition {
        match self.cache.entry(CacheKey::new(&tent, &axis_limit)) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                trace!("tent cache hit for {tent:?} / {axis_limit:?}");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                entry.insert(rebase_tent(tent, axis_limit)).clone()
            }
        }
    }

    /// Number of distinct inputs solved so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

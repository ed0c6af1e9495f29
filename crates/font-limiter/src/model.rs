//! Variation math shared by the solver and the feature-variation instancer.
//!
//! All coordinates are normalized: the axis default is 0, the axis extremes
//! are -1 and +1.

use crate::limits::AxisLimit;

/// Largest value representable as F2Dot14 (0x7FFF / 16384, about 1.99994).
pub const MAX_F2DOT14: f64 = 0x7FFF as f64 / (1 << 14) as f64;

/// A triangular support region along one axis.
///
/// The weight is 0 outside `lower..upper`, rises linearly to 1 at `peak`
/// and falls back to 0 at `upper`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tent {
    pub lower: f64,
    pub peak: f64,
    pub upper: f64,
}

impl Tent {
    pub const fn new(lower: f64, peak: f64, upper: f64) -> Self {
        Self { lower, peak, upper }
    }

    /// Mirror the tent around zero: `(l, p, u)` becomes `(-u, -p, -l)`.
    pub fn reverse_negate(self) -> Self {
        Self::new(-self.upper, -self.peak, -self.lower)
    }

    /// Whether `lower <= peak <= upper` and the tent does not straddle zero.
    pub fn is_well_formed(&self) -> bool {
        self.lower <= self.peak
            && self.peak <= self.upper
            && !(self.lower < 0.0 && self.upper > 0.0)
    }

    /// Weight of this tent at `coord`.
    pub fn value_at(&self, coord: f64) -> f64 {
        support_scalar(coord, self)
    }
}

impl From<(f64, f64, f64)> for Tent {
    fn from((lower, peak, upper): (f64, f64, f64)) -> Self {
        Self::new(lower, peak, upper)
    }
}

/// Evaluate a single-axis support region at a normalized coordinate.
///
/// Follows OpenType region semantics: a zero peak, an inverted tent, or a
/// tent that straddles zero contributes a weight of 1 regardless of `coord`.
pub fn support_scalar(coord: f64, tent: &Tent) -> f64 {
    let Tent { lower, peak, upper } = *tent;

    if peak == 0.0 {
        return 1.0;
    }
    if lower > peak || peak > upper {
        return 1.0;
    }
    if lower < 0.0 && upper > 0.0 {
        return 1.0;
    }
    if coord == peak {
        return 1.0;
    }
    if coord <= lower || upper <= coord {
        return 0.0;
    }

    if coord < peak {
        (coord - lower) / (peak - lower)
    } else {
        (upper - coord) / (upper - peak)
    }
}

/// Map a coordinate expressed against the old axis range into the range
/// described by `limit`, where `limit.minimum`, `limit.default` and
/// `limit.maximum` become -1, 0 and +1.
///
/// Without `extrapolate`, `value` is first clamped into the limit. A pinned
/// limit maps everything to 0.
pub fn normalize_value(value: f64, limit: &AxisLimit, extrapolate: bool) -> f64 {
    let AxisLimit { minimum: lower, default, maximum: upper } = *limit;
    debug_assert!(lower <= default && default <= upper);

    let value = if extrapolate { value } else { value.clamp(lower, upper) };

    if value == default || lower == upper {
        return 0.0;
    }

    if (value < default && lower != default) || (value > default && upper == default) {
        (value - default) / (default - lower)
    } else {
        (value - default) / (upper - default)
    }
}

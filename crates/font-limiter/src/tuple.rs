//! Restricting tuple variations (deltasets) to new axis limits.
//!
//! A tuple variation carries one tent per participating axis and one delta
//! per point. Limiting an axis replaces the tuple with one tuple per piece of
//! the rebased tent, each with its deltas scaled.

use std::collections::BTreeMap;

use kurbo::Vec2;
use read_fonts::types::Tag;

use crate::{
    limits::{AxisLimit, AxisLimits},
    model::Tent,
    solver::TentSolver,
};

/// A deltaset and the region where it applies.
///
/// `None` deltas are points left for IUP inference.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleVariation {
    pub axes: BTreeMap<Tag, Tent>,
    pub deltas: Vec<Option<Vec2>>,
}

impl TupleVariation {
    pub fn new(axes: impl IntoIterator<Item = (Tag, Tent)>, deltas: Vec<Option<Vec2>>) -> Self {
        Self { axes: axes.into_iter().collect(), deltas }
    }

    /// Multiply every explicit delta by `scalar`.
    pub fn scale(&mut self, scalar: f64) {
        for delta in self.deltas.iter_mut().flatten() {
            *delta = *delta * scalar;
        }
    }

    /// Weight of this tuple at a normalized location. Axes missing from the
    /// location are at their default.
    pub fn scalar_at(&self, location: &BTreeMap<Tag, f64>) -> f64 {
        let mut scalar = 1.0;
        for (tag, tent) in &self.axes {
            let coord = location.get(tag).copied().unwrap_or(0.0);
            scalar *= tent.value_at(coord);
            if scalar == 0.0 {
                break;
            }
        }
        scalar
    }

    /// Whether the tuple applies everywhere (no axis restricts it).
    pub fn is_default(&self) -> bool {
        self.axes.is_empty()
    }
}

/// Restrict one axis of `var` to `limit`.
///
/// Returns the replacement tuples; an empty result means the tuple no longer
/// contributes anywhere in the new range.
pub fn change_tuple_axis_limit(
    mut var: TupleVariation,
    tag: Tag,
    limit: AxisLimit,
    solver: &mut TentSolver,
) -> Vec<TupleVariation> {
    let Some(tent) = var.axes.get(&tag).copied() else {
        return vec![var];
    };

    // Explicit no-op axis
    if tent.peak == 0.0 {
        var.axes.remove(&tag);
        return vec![var];
    }

    if !tent.is_well_formed() {
        return Vec::new();
    }

    solver
        .rebase(tent, limit)
        .into_iter()
        .map(|(scalar, new_tent)| {
            let mut out = var.clone();
            if new_tent.peak == 0.0 {
                out.axes.remove(&tag);
            } else {
                out.axes.insert(tag, new_tent);
            }
            out.scale(scalar);
            out
        })
        .collect()
}

/// Restrict every tuple in `vars` to all of `limits`, one axis at a time in
/// tag order.
pub fn limit_tuple_variations(
    vars: Vec<TupleVariation>,
    limits: &AxisLimits,
    solver: &mut TentSolver,
) -> Vec<TupleVariation> {
    limits.iter().fold(vars, |vars, (tag, limit)| {
        vars.into_iter()
            .flat_map(|var| change_tuple_axis_limit(var, tag, *limit, solver))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WGHT: Tag = Tag::new(b"wght");
    const WDTH: Tag = Tag::new(b"wdth");

    fn tuple(axes: &[(Tag, (f64, f64, f64))], deltas: &[Option<(f64, f64)>]) -> TupleVariation {
        TupleVariation::new(
            axes.iter().map(|(tag, t)| (*tag, Tent::from(*t))),
            deltas.iter().map(|d| d.map(|(x, y)| Vec2::new(x, y))).collect(),
        )
    }

    fn limit(min: f64, default: f64, max: f64) -> AxisLimit {
        AxisLimit::new(min, default, max).unwrap()
    }

    #[test]
    fn cut_scales_deltas() {
        let var = tuple(&[(WGHT, (0.0, 1.0, 1.0))], &[Some((100.0, -40.0)), None]);
        let out = change_tuple_axis_limit(var, WGHT, limit(-1.0, 0.0, 0.5), &mut TentSolver::new());

        assert_eq!(out, vec![tuple(&[(WGHT, (0.0, 1.0, 1.0))], &[Some((50.0, -20.0)), None])]);
    }

    #[test]
    fn pinning_removes_axis() {
        let var = tuple(&[(WGHT, (0.0, 1.0, 1.0)), (WDTH, (0.0, 1.0, 1.0))], &[Some((10.0, 10.0))]);
        let out = change_tuple_axis_limit(var, WGHT, limit(0.5, 0.5, 0.5), &mut TentSolver::new());

        assert_eq!(out, vec![tuple(&[(WDTH, (0.0, 1.0, 1.0))], &[Some((5.0, 5.0))])]);
    }

    #[test]
    fn pinning_outside_support_drops_tuple() {
        let var = tuple(&[(WGHT, (0.0, 1.0, 1.0))], &[Some((10.0, 0.0))]);
        let mut solver = TentSolver::new();
        let out = change_tuple_axis_limit(var, WGHT, limit(-0.5, -0.5, -0.5), &mut solver);
        assert!(out.is_empty());
    }

    #[test]
    fn unrelated_axis_is_untouched() {
        let var = tuple(&[(WDTH, (0.0, 1.0, 1.0))], &[Some((10.0, 0.0))]);
        let mut solver = TentSolver::new();
        let out = change_tuple_axis_limit(var.clone(), WGHT, limit(0.0, 0.0, 0.0), &mut solver);
        assert_eq!(out, vec![var]);
    }

    #[test]
    fn explicit_zero_peak_is_removed() {
        let var = tuple(&[(WGHT, (0.0, 0.0, 0.0)), (WDTH, (0.0, 1.0, 1.0))], &[Some((1.0, 1.0))]);
        let out = change_tuple_axis_limit(var, WGHT, limit(-1.0, 0.0, 0.5), &mut TentSolver::new());
        assert_eq!(out, vec![tuple(&[(WDTH, (0.0, 1.0, 1.0))], &[Some((1.0, 1.0))])]);
    }

    #[test]
    fn straddling_tent_is_dropped() {
        let var = tuple(&[(WGHT, (-0.5, 0.5, 1.0))], &[Some((1.0, 1.0))]);
        let out = change_tuple_axis_limit(var, WGHT, limit(-1.0, 0.0, 0.5), &mut TentSolver::new());
        assert!(out.is_empty());
    }

    #[test]
    fn gain_splits_tuple_and_preserves_values() {
        let var = tuple(&[(WGHT, (0.0, 0.5, 1.0))], &[Some((100.0, 0.0))]);
        let new_limit = limit(-1.0, 0.25, 1.0);
        let out = change_tuple_axis_limit(var.clone(), WGHT, new_limit, &mut TentSolver::new());

        // baseline + two positive pieces + two negative pieces
        assert_eq!(out.len(), 5);
        assert_eq!(out.iter().filter(|v| v.is_default()).count(), 1);

        for i in -20..=20 {
            let new_coord = f64::from(i) / 20.0;
            let old_coord = if new_coord < 0.0 {
                new_limit.default + new_coord * (new_limit.default - new_limit.minimum)
            } else {
                new_limit.default + new_coord * (new_limit.maximum - new_limit.default)
            };

            let expected = var.scalar_at(&BTreeMap::from([(WGHT, old_coord)])) * 100.0;
            let actual: f64 = out
                .iter()
                .map(|v| {
                    let delta = v.deltas[0].unwrap().x;
                    v.scalar_at(&BTreeMap::from([(WGHT, new_coord)])) * delta
                })
                .sum();
            assert!((expected - actual).abs() < 1e-6, "at {new_coord}: {expected} != {actual}");
        }
    }

    #[test]
    fn limits_apply_to_every_axis() {
        let vars = vec![
            tuple(&[(WGHT, (0.0, 1.0, 1.0))], &[Some((10.0, 0.0))]),
            tuple(&[(WDTH, (-1.0, -1.0, 0.0))], &[Some((0.0, 8.0))]),
        ];
        let limits: AxisLimits = [
            (WGHT, limit(-1.0, 0.0, 0.5)),
            (WDTH, limit(-0.5, -0.5, -0.5)),
        ]
        .into_iter()
        .collect();

        let mut solver = TentSolver::new();
        let out = limit_tuple_variations(vars, &limits, &mut solver);

        assert_eq!(
            out,
            vec![
                tuple(&[(WGHT, (0.0, 1.0, 1.0))], &[Some((5.0, 0.0))]),
                tuple(&[], &[Some((0.0, 4.0))]),
            ]
        );
        assert_eq!(solver.len(), 2);
    }
}

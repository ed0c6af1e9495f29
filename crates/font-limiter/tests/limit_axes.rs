use std::collections::BTreeMap;

use font_limiter::{
    AxisLimit, AxisLimits, Condition, Feature, FeatureRecord, FeatureTableSubstitutionRecord,
    FeatureVariationRecord, FeatureVariations, LayoutTable, MAX_F2DOT14, Tent, TentSolver,
    TupleVariation, UserAxisLimit, instantiate_feature_variations, limit_feature_variations,
    limit_hvar_regions, limit_tuple_variations, rebase_tent,
};
use kurbo::Vec2;
use read_fonts::{
    FontRef,
    types::{MajorMinor, Tag},
};

const WGHT: Tag = Tag::new(b"wght");
const WDTH: Tag = Tag::new(b"wdth");
const OPSZ: Tag = Tag::new(b"opsz");

const TOLERANCE: f64 = 1e-3;

fn tents() -> Vec<Tent> {
    let values = [-2.0, -1.5, -1.0, -0.75, -0.5, -0.25, 0.0, 0.25, 0.5, 0.75, 1.0, 1.5, 2.0];
    let mut tents = Vec::new();
    for (i, &lower) in values.iter().enumerate() {
        for (j, &peak) in values.iter().enumerate().skip(i) {
            for &upper in &values[j..] {
                let tent = Tent::new(lower, peak, upper);
                if peak != 0.0 && tent.is_well_formed() {
                    tents.push(tent);
                }
            }
        }
    }
    tents
}

fn limits() -> Vec<AxisLimit> {
    let values = [-1.0, -0.5, -0.25, 0.0, 0.25, 0.5, 1.0];
    let mut limits = Vec::new();
    for (i, &min) in values.iter().enumerate() {
        for (j, &default) in values.iter().enumerate().skip(i) {
            for &max in &values[j..] {
                limits.push(AxisLimit::new(min, default, max).unwrap());
            }
        }
    }
    limits
}

/// Normalized coordinates reachable in the new range.
fn samples(limit: &AxisLimit) -> Vec<f64> {
    (-40..=40)
        .map(|i| f64::from(i) / 40.0)
        .filter(|x| {
            (*x < 0.0 && limit.minimum < limit.default)
                || (*x > 0.0 && limit.maximum > limit.default)
                || *x == 0.0
        })
        .collect()
}

/// Map a coordinate of the new range back to the old range.
fn denormalize(x: f64, limit: &AxisLimit) -> f64 {
    if x < 0.0 {
        limit.default + x * (limit.default - limit.minimum)
    } else {
        limit.default + x * (limit.maximum - limit.default)
    }
}

#[test]
fn decomposition_reproduces_the_original_tent() {
    for limit in limits() {
        for tent in tents() {
            let pieces = rebase_tent(tent, limit);
            for x in samples(&limit) {
                let expected = tent.value_at(denormalize(x, &limit));
                let actual: f64 = pieces.iter().map(|(scalar, t)| scalar * t.value_at(x)).sum();
                assert!(
                    (expected - actual).abs() < TOLERANCE,
                    "{tent:?} / {limit:?} at {x}: expected {expected}, got {actual} from {pieces:?}"
                );
            }
        }
    }
}

#[test]
fn decomposition_is_encodable() {
    for limit in limits() {
        for tent in tents() {
            for (scalar, t) in rebase_tent(tent, limit) {
                assert_ne!(scalar, 0.0, "{tent:?} / {limit:?}");
                for coord in [t.lower, t.peak, t.upper] {
                    assert!(
                        coord.abs() <= MAX_F2DOT14 + 1e-9,
                        "{tent:?} / {limit:?} produced {t:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn solver_cache_matches_direct_solve() {
    let mut solver = TentSolver::new();
    for limit in limits() {
        for tent in tents().into_iter().take(40) {
            assert_eq!(solver.rebase(tent, limit), rebase_tent(tent, limit));
            assert_eq!(solver.rebase(tent, limit), rebase_tent(tent, limit));
        }
    }
    assert_eq!(solver.hits(), solver.misses());
}

#[test]
fn limited_tuples_keep_their_deltas() {
    let vars = vec![
        TupleVariation::new(
            [(WGHT, Tent::new(0.0, 1.0, 1.0))],
            vec![Some(Vec2::new(100.0, 20.0))],
        ),
        TupleVariation::new(
            [(WGHT, Tent::new(-1.0, -1.0, 0.0))],
            vec![Some(Vec2::new(-60.0, 0.0))],
        ),
        TupleVariation::new(
            [(WGHT, Tent::new(0.0, 0.5, 1.0)), (WDTH, Tent::new(0.0, 1.0, 1.0))],
            vec![Some(Vec2::new(10.0, -10.0))],
        ),
    ];
    let limits: AxisLimits = [
        (WGHT, AxisLimit::new(-0.5, 0.25, 0.75).unwrap()),
        (WDTH, AxisLimit::new(0.0, 0.0, 0.5).unwrap()),
    ]
    .into_iter()
    .collect();

    let limited = limit_tuple_variations(vars.clone(), &limits, &mut TentSolver::new());

    let delta_at = |vars: &[TupleVariation], location: &BTreeMap<Tag, f64>| {
        vars.iter()
            .filter_map(|v| v.deltas[0].map(|d| d * v.scalar_at(location)))
            .fold(Vec2::ZERO, |acc, d| acc + d)
    };

    for i in -10..=10 {
        for j in 0..=10 {
            let (x, y) = (f64::from(i) / 10.0, f64::from(j) / 10.0);
            let new_location = BTreeMap::from([(WGHT, x), (WDTH, y)]);
            let old_location = BTreeMap::from([
                (WGHT, denormalize(x, limits.get(WGHT).unwrap())),
                (WDTH, denormalize(y, limits.get(WDTH).unwrap())),
            ]);

            let expected = delta_at(&vars, &old_location);
            let actual = delta_at(&limited, &new_location);
            assert!(
                (expected - actual).hypot() < TOLERANCE,
                "at ({x}, {y}): {expected:?} != {actual:?}"
            );
        }
    }
}

fn gsub(records: Vec<FeatureVariationRecord>) -> LayoutTable {
    LayoutTable::new(
        Tag::new(b"GSUB"),
        vec![
            FeatureRecord::new(Tag::new(b"rvrn"), [0]),
            FeatureRecord::new(Tag::new(b"liga"), [1]),
        ],
    )
    .with_feature_variations(FeatureVariations::new(records))
}

fn substitution(lookups: &[u16]) -> Vec<FeatureTableSubstitutionRecord> {
    vec![FeatureTableSubstitutionRecord::new(0, lookups.to_vec())]
}

#[test]
fn pinning_inside_condition_merges_substitution_once() {
    let mut table = gsub(vec![
        FeatureVariationRecord::new(vec![Condition::axis_range(0, 0.25, 0.75)], substitution(&[2])),
        FeatureVariationRecord::new(vec![Condition::axis_range(0, 0.25, 0.75)], substitution(&[3])),
    ]);
    let limits: AxisLimits = [(WGHT, AxisLimit::pinned(0.5).unwrap())].into_iter().collect();

    instantiate_feature_variations(&mut table, &[WGHT], &limits);

    assert_eq!(table.feature(0), Some(&Feature::new([2])));
    assert_eq!(table.feature(1), Some(&Feature::new([1])));
    assert_eq!(table.feature_variations, None);
    assert_eq!(table.version, MajorMinor::VERSION_1_0);
}

#[test]
fn narrowing_keeps_variable_records_in_order() {
    // fvar order is opsz, wght, wdth
    let mut table = gsub(vec![
        FeatureVariationRecord::new(
            vec![Condition::axis_range(1, 0.5, 1.0), Condition::axis_range(2, -1.0, 0.5)],
            substitution(&[2]),
        ),
        FeatureVariationRecord::new(vec![Condition::axis_range(2, 0.75, 1.0)], substitution(&[3])),
        FeatureVariationRecord::new(
            vec![Condition::axis_range(2, -1.0, 0.5), Condition::axis_range(1, 0.5, 1.0)],
            substitution(&[4]),
        ),
    ]);
    // opsz pinned at its default, wdth capped at half its positive range
    let limits: AxisLimits = [
        (OPSZ, AxisLimit::pinned(0.0).unwrap()),
        (WDTH, AxisLimit::new(-1.0, 0.0, 0.5).unwrap()),
    ]
    .into_iter()
    .collect();

    instantiate_feature_variations(&mut table, &[OPSZ, WGHT, WDTH], &limits);

    // wght moves to index 0. The wdth conditions now span the whole axis and
    // go away, the second record is out of range, and the third duplicates
    // the first.
    let records = &table.feature_variations.as_ref().unwrap().records;
    assert_eq!(
        records,
        &[FeatureVariationRecord::new(vec![Condition::axis_range(0, 0.5, 1.0)], substitution(&[2]))]
    );
    assert_eq!(table.version, MajorMinor::VERSION_1_1);
    assert_eq!(table.feature(0), Some(&Feature::new([0])));
}

#[test]
fn vazirmatn_limits_from_user_space() {
    let font = FontRef::new(font_test_data::VAZIRMATN_VAR).unwrap();
    let limits =
        AxisLimits::from_user(&font, &["wght=100:400:900".parse::<UserAxisLimit>().unwrap()])
            .unwrap();
    assert_eq!(limits.get(WGHT), Some(&AxisLimit::DEFAULT));

    let layout = limit_feature_variations(font_test_data::VAZIRMATN_VAR, &limits).unwrap();
    for table in layout.tables() {
        assert_eq!(table.feature_variations.is_some(), table.version == MajorMinor::VERSION_1_1);
    }
}

#[test]
fn vazirmatn_hvar_regions_follow_narrowed_axis() {
    let font = FontRef::new(font_test_data::VAZIRMATN_VAR).unwrap();
    let limits =
        AxisLimits::from_user(&font, &[UserAxisLimit::range("wght", 400.0, 900.0)]).unwrap();

    let regions =
        limit_hvar_regions(font_test_data::VAZIRMATN_VAR, &limits, &mut TentSolver::new()).unwrap();

    // only the positive region survives, unchanged
    assert_eq!(
        regions,
        vec![TupleVariation::new(
            [(WGHT, Tent::new(0.0, 1.0, 1.0))],
            vec![Some(Vec2::new(1.0, 0.0))]
        )]
    );
}

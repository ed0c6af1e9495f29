//! Instancing of FeatureVariations.
//!
//! Each record is first checked against the new axis defaults (does it apply
//! to the new default instance, can it still apply anywhere?), then its
//! remaining conditions are renormalized into the new axis ranges. The first
//! record that applies at the default has its substitutions merged into the
//! FeatureList. Records that survive are deduplicated, and the table is
//! dropped when none are left.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, warn};
use read_fonts::types::{F2Dot14, MajorMinor, Tag};

use crate::{
    layout::{
        Condition, ConditionFormat1, ConditionSet, FeatureTableSubstitution,
        FeatureVariationRecord, FeatureVariations, LayoutTable,
    },
    limits::{AxisLimit, AxisLimits},
    model::normalize_value,
};

/// Rewrite the FeatureVariations of `table` for the restricted axes.
///
/// `fvar_axes` is the font's axis order (condition axis indices refer to it).
/// Axes pinned by `limits` disappear from the new axis order, so surviving
/// conditions are re-indexed. Does nothing if the table has no
/// FeatureVariations.
pub fn instantiate_feature_variations(
    table: &mut LayoutTable,
    fvar_axes: &[Tag],
    limits: &AxisLimits,
) {
    let Some(feature_variations) = table.feature_variations.take() else {
        return;
    };

    let pinned = limits.pinned_location();
    let axis_order: Vec<Tag> =
        fvar_axes.iter().copied().filter(|tag| !pinned.contains_key(tag)).collect();
    let axis_index_map: HashMap<Tag, u16> =
        axis_order.iter().enumerate().map(|(i, tag)| (*tag, i as u16)).collect();

    let mut applied = false;
    let mut seen = HashSet::new();
    let mut new_records = Vec::new();

    for (i, record) in feature_variations.records.into_iter().enumerate() {
        let RecordState { applies, conditions } =
            check_record(&record, i, fvar_axes, limits, &axis_index_map);

        if applies && !applied {
            apply_substitutions(table, &record.feature_table_substitution, i);
            applied = true;
        }

        let Some(conditions) = conditions.and_then(|c| limit_conditions(c, limits, &axis_order))
        else {
            debug!("{}: dropping FeatureVariationRecord {i}", table.tag);
            continue;
        };

        let record = FeatureVariationRecord {
            condition_set: ConditionSet { conditions },
            feature_table_substitution: record.feature_table_substitution,
        };
        if is_unique(&record, axis_order.len(), &mut seen) {
            new_records.push(record);
        } else {
            debug!("{}: FeatureVariationRecord {i} is a duplicate", table.tag);
        }
    }

    if new_records.is_empty() {
        table.version = MajorMinor::VERSION_1_0;
    } else {
        table.feature_variations =
            Some(FeatureVariations { version: feature_variations.version, records: new_records });
    }
}

/// Outcome of checking a record against the new axis defaults.
struct RecordState {
    /// Every condition holds at the new default location.
    applies: bool,
    /// Conditions left to vary, `None` if the record should be dropped.
    conditions: Option<Vec<Condition>>,
}

fn check_record(
    record: &FeatureVariationRecord,
    record_index: usize,
    fvar_axes: &[Tag],
    limits: &AxisLimits,
    axis_index_map: &HashMap<Tag, u16>,
) -> RecordState {
    let mut applies = true;
    let mut conditions = Vec::new();

    for (i, condition) in record.condition_set.conditions.iter().enumerate() {
        let axis_range = match condition {
            Condition::AxisRange(c) => {
                let tag = fvar_axes.get(c.axis_index as usize);
                if tag.is_none() {
                    warn!(
                        "Condition table {i} of FeatureVariationRecord {record_index} \
                         references unknown axis {}; ignored",
                        c.axis_index
                    );
                }
                tag.map(|tag| (c, *tag))
            }
            Condition::Unsupported { format } => {
                warn!(
                    "Condition table {i} of FeatureVariationRecord {record_index} has \
                     unsupported format ({format}); ignored"
                );
                None
            }
        };

        let Some((c, tag)) = axis_range else {
            applies = false;
            conditions.push(*condition);
            continue;
        };

        let (min, max) = (c.min(), c.max());
        let limit = limits.get_or_default(tag);
        if !(min <= limit.default && limit.default <= max) {
            applies = false;
            // Cannot match anywhere in the new range either
            if limit.minimum > max || limit.maximum < min {
                return RecordState { applies, conditions: None };
            }
        }

        // Conditions on pinned axes are settled by now
        if let Some(&axis_index) = axis_index_map.get(&tag) {
            conditions.push(Condition::AxisRange(ConditionFormat1 { axis_index, ..*c }));
        }
    }

    let conditions = (!conditions.is_empty()).then_some(conditions);
    RecordState { applies, conditions }
}

/// Renormalize axis-range conditions into the new axis ranges.
///
/// `axis_order` is the new axis order; conditions must already be
/// re-indexed against it. Returns `None` if some condition can no longer be
/// met. A condition that now spans the whole axis is dropped.
fn limit_conditions(
    conditions: Vec<Condition>,
    limits: &AxisLimits,
    axis_order: &[Tag],
) -> Option<Vec<Condition>> {
    let mut out = Vec::with_capacity(conditions.len());

    for condition in conditions {
        let Condition::AxisRange(c) = condition else {
            out.push(condition);
            continue;
        };
        let Some(limit) = axis_order.get(c.axis_index as usize).and_then(|tag| limits.get(*tag))
        else {
            out.push(condition);
            continue;
        };

        let (min, max) = limit_condition_range(&c, limit)?;
        if min != -1.0 || max != 1.0 {
            out.push(Condition::AxisRange(ConditionFormat1 {
                filter_range_min_value: F2Dot14::from_f32(min as f32),
                filter_range_max_value: F2Dot14::from_f32(max as f32),
                ..c
            }));
        }
    }

    Some(out)
}

fn limit_condition_range(condition: &ConditionFormat1, limit: &AxisLimit) -> Option<(f64, f64)> {
    let (min, max) = (condition.min(), condition.max());
    if min > max || min > limit.maximum || max < limit.minimum {
        return None;
    }
    Some((normalize_value(min, limit, false), normalize_value(max, limit, false)))
}

fn apply_substitutions(
    table: &mut LayoutTable,
    substitution: &FeatureTableSubstitution,
    record_index: usize,
) {
    if substitution.version != MajorMinor::VERSION_1_0 {
        debug!(
            "{}: FeatureTableSubstitution {}.{} of record {record_index} merged as 1.0",
            table.tag, substitution.version.major, substitution.version.minor
        );
    }

    for rec in &substitution.substitutions {
        match table.feature_list.get_mut(rec.feature_index as usize) {
            Some(feature_record) => {
                debug!(
                    "{}: applying '{}' substitution from record {record_index}",
                    table.tag, feature_record.tag
                );
                feature_record.feature = rec.alternate_feature.clone();
            }
            None => warn!(
                "{}: FeatureVariationRecord {record_index} substitutes missing feature {}",
                table.tag, rec.feature_index
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum KeyPart {
    Version(u16, u16),
    AxisRange(u16, i16, i16),
}

/// Whether no record with the same substitution version and the same set of
/// axis ranges was seen before. Records with conditions that cannot be
/// compared (unsupported formats, or axis indices past `axis_count`) are
/// always unique.
fn is_unique(
    record: &FeatureVariationRecord,
    axis_count: usize,
    seen: &mut HashSet<BTreeSet<KeyPart>>,
) -> bool {
    let version = record.feature_table_substitution.version;
    let mut key = BTreeSet::from([KeyPart::Version(version.major, version.minor)]);

    for condition in &record.condition_set.conditions {
        match condition {
            Condition::AxisRange(c) if c.axis_index as usize >= axis_count => return true,
            Condition::AxisRange(c) => {
                key.insert(KeyPart::AxisRange(
                    c.axis_index,
                    c.filter_range_min_value.to_bits(),
                    c.filter_range_max_value.to_bits(),
                ));
            }
            Condition::Unsupported { .. } => return true,
        }
    }

    seen.insert(key)
}

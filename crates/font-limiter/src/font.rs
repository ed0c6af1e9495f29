//! Reading the tables touched by axis limiting out of a parsed font.

use std::collections::BTreeMap;

use kurbo::Vec2;
use log::info;
use read_fonts::{
    FontRef, TableProvider,
    tables::{
        gpos::Gpos,
        gsub::Gsub,
        layout::{
            Condition as RawCondition, Feature as RawFeature, FeatureList as RawFeatureList,
            FeatureTableSubstitution as RawFeatureTableSubstitution,
            FeatureVariations as RawFeatureVariations,
        },
    },
    types::{F2Dot14, Fixed, MajorMinor, Tag},
};

use crate::{
    error::{Error, Result},
    feature_vars::instantiate_feature_variations,
    layout::{
        Condition, ConditionFormat1, ConditionSet, Feature, FeatureRecord,
        FeatureTableSubstitution, FeatureTableSubstitutionRecord, FeatureVariationRecord,
        FeatureVariations, LayoutTable,
    },
    limits::{AxisLimit, AxisLimits, UserAxisLimit},
    model::Tent,
    solver::TentSolver,
    tuple::{TupleVariation, limit_tuple_variations},
};

const GSUB: Tag = Tag::new(b"GSUB");
const GPOS: Tag = Tag::new(b"GPOS");

/// Axis tags in `fvar` order.
pub fn fvar_axes(font: &FontRef) -> Result<Vec<Tag>> {
    let fvar = font.fvar().map_err(|_| Error::NotVariableFont)?;
    Ok(fvar.axes()?.iter().map(|axis| axis.axis_tag()).collect())
}

impl AxisLimits {
    /// Convert user-space limits to normalized limits, applying `avar`.
    ///
    /// A limit without a default takes the axis default, clamped into the
    /// new range.
    ///
    /// # Errors
    ///
    /// - `Error::NotVariableFont` if the font has no fvar table
    /// - `Error::AxisNotFound` for a tag missing from fvar
    /// - `Error::InvalidAxisValue` for a value outside the axis range
    pub fn from_user(font: &FontRef, user_limits: &[UserAxisLimit]) -> Result<Self> {
        let fvar = font.fvar().map_err(|_| Error::NotVariableFont)?;
        let avar = font.avar().ok();
        let axes = fvar.axes()?;

        let mut limits = AxisLimits::new();
        for limit in user_limits {
            let (index, axis) = axes
                .iter()
                .enumerate()
                .find(|(_, axis)| axis.axis_tag() == limit.tag)
                .ok_or_else(|| Error::AxisNotFound(limit.tag.to_string()))?;

            let (axis_min, axis_default, axis_max) = (
                axis.min_value().to_f64(),
                axis.default_value().to_f64(),
                axis.max_value().to_f64(),
            );
            for value in [limit.minimum, limit.maximum].into_iter().chain(limit.default) {
                if !(axis_min..=axis_max).contains(&value) {
                    return Err(Error::InvalidAxisValue {
                        tag: limit.tag.to_string(),
                        value,
                        min: axis_min,
                        max: axis_max,
                    });
                }
            }
            let default =
                limit.default.unwrap_or_else(|| axis_default.clamp(limit.minimum, limit.maximum));

            let normalize = |value: f64| {
                let mut coords = vec![F2Dot14::ZERO; axes.len()];
                fvar.user_to_normalized(
                    avar.as_ref(),
                    [(limit.tag, Fixed::from_f64(value))],
                    &mut coords,
                );
                f64::from(coords[index].to_f32())
            };

            let normalized = AxisLimit::new(
                normalize(limit.minimum),
                normalize(default),
                normalize(limit.maximum),
            )?;
            limits.insert(limit.tag, normalized);
        }

        Ok(limits)
    }
}

impl LayoutTable {
    pub fn from_gsub(gsub: &Gsub) -> Result<Self> {
        read_layout(
            GSUB,
            gsub.version(),
            &gsub.feature_list()?,
            gsub.feature_variations().transpose()?,
        )
    }

    pub fn from_gpos(gpos: &Gpos) -> Result<Self> {
        read_layout(
            GPOS,
            gpos.version(),
            &gpos.feature_list()?,
            gpos.feature_variations().transpose()?,
        )
    }
}

fn read_layout(
    tag: Tag,
    version: MajorMinor,
    feature_list: &RawFeatureList,
    feature_variations: Option<RawFeatureVariations>,
) -> Result<LayoutTable> {
    let data = feature_list.offset_data();
    let feature_list = feature_list
        .feature_records()
        .iter()
        .map(|record| {
            Ok(FeatureRecord {
                tag: record.feature_tag(),
                feature: read_feature(&record.feature(data)?),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let feature_variations = feature_variations.map(|fv| read_feature_variations(&fv)).transpose()?;

    Ok(LayoutTable { tag, version, feature_list, feature_variations })
}

fn read_feature(feature: &RawFeature) -> Feature {
    Feature { lookup_indices: feature.lookup_list_indices().iter().map(|i| i.get()).collect() }
}

fn read_feature_variations(fv: &RawFeatureVariations) -> Result<FeatureVariations> {
    let data = fv.offset_data();
    let records = fv
        .feature_variation_records()
        .iter()
        .map(|record| {
            let conditions = match record.condition_set(data).transpose()? {
                Some(set) => set
                    .conditions()
                    .iter()
                    .map(|condition| condition.map(read_condition))
                    .collect::<std::result::Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            let feature_table_substitution =
                match record.feature_table_substitution(data).transpose()? {
                    Some(fts) => read_substitution(&fts)?,
                    None => FeatureTableSubstitution::new(Vec::new()),
                };
            Ok(FeatureVariationRecord {
                condition_set: ConditionSet { conditions },
                feature_table_substitution,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureVariations { version: fv.version(), records })
}

fn read_condition(condition: RawCondition) -> Condition {
    match condition {
        RawCondition::Format1AxisRange(c) => Condition::AxisRange(ConditionFormat1 {
            axis_index: c.axis_index(),
            filter_range_min_value: c.filter_range_min_value(),
            filter_range_max_value: c.filter_range_max_value(),
        }),
        other => Condition::Unsupported { format: other.format() },
    }
}

fn read_substitution(fts: &RawFeatureTableSubstitution) -> Result<FeatureTableSubstitution> {
    let data = fts.offset_data();
    let substitutions = fts
        .substitutions()
        .iter()
        .map(|record| {
            Ok(FeatureTableSubstitutionRecord {
                feature_index: record.feature_index(),
                alternate_feature: read_feature(&record.alternate_feature(data)?),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureTableSubstitution { version: fts.version(), substitutions })
}

/// GSUB and GPOS after instancing their FeatureVariations.
///
/// A table is `None` if the font lacks it or it carries no
/// FeatureVariations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitedLayout {
    pub gpos: Option<LayoutTable>,
    pub gsub: Option<LayoutTable>,
}

impl LimitedLayout {
    pub fn tables(&self) -> impl Iterator<Item = &LayoutTable> {
        self.gpos.iter().chain(self.gsub.iter())
    }
}

/// Instance the FeatureVariations of GPOS and GSUB for `limits`.
///
/// Lookups that are no longer referenced are left in place.
pub fn limit_feature_variations(data: &[u8], limits: &AxisLimits) -> Result<LimitedLayout> {
    let font = FontRef::new(data)?;
    let fvar_axes = fvar_axes(&font)?;

    let gpos = match font.gpos() {
        Ok(gpos) => Some(LayoutTable::from_gpos(&gpos)?),
        Err(_) => None,
    };
    let gsub = match font.gsub() {
        Ok(gsub) => Some(LayoutTable::from_gsub(&gsub)?),
        Err(_) => None,
    };

    let limit = |table: Option<LayoutTable>| {
        let mut table = table.filter(|t| t.feature_variations.is_some())?;
        info!("Instantiating FeatureVariations of {} table", table.tag);
        instantiate_feature_variations(&mut table, &fvar_axes, limits);
        Some(table)
    };

    Ok(LimitedLayout { gpos: limit(gpos), gsub: limit(gsub) })
}

/// Regions of the HVAR item variation store, keyed by fvar axis tag.
///
/// Axes with a zero peak are left out, as they do not restrict the region.
pub fn hvar_regions(font: &FontRef) -> Result<Vec<BTreeMap<Tag, Tent>>> {
    let axes = fvar_axes(font)?;
    let Ok(hvar) = font.hvar() else {
        return Ok(Vec::new());
    };
    let store = hvar.item_variation_store()?;
    let region_list = store.variation_region_list()?;

    region_list
        .variation_regions()
        .iter()
        .map(|region| -> Result<BTreeMap<Tag, Tent>> {
            Ok(region?
                .region_axes()
                .iter()
                .zip(&axes)
                .filter(|(coords, _)| coords.peak_coord() != F2Dot14::ZERO)
                .map(|(coords, tag)| {
                    let tent = Tent::new(
                        f64::from(coords.start_coord().to_f32()),
                        f64::from(coords.peak_coord().to_f32()),
                        f64::from(coords.end_coord().to_f32()),
                    );
                    (*tag, tent)
                })
                .collect())
        })
        .collect()
}

/// Rebase every HVAR region onto `limits`.
///
/// Each region is carried as a deltaset with a single unit delta, so the
/// x delta of each output tuple is the share of the original region it
/// represents.
pub fn limit_hvar_regions(
    data: &[u8],
    limits: &AxisLimits,
    solver: &mut TentSolver,
) -> Result<Vec<TupleVariation>> {
    let font = FontRef::new(data)?;
    let regions = hvar_regions(&font)?
        .into_iter()
        .map(|axes| TupleVariation { axes, deltas: vec![Some(Vec2::new(1.0, 0.0))] })
        .collect();

    Ok(limit_tuple_variations(regions, limits, solver))
}

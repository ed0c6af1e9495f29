//! Mutable record model of the parts of GSUB/GPOS that feature-variation
//! instancing rewrites.

use std::fmt;

use read_fonts::types::{F2Dot14, MajorMinor, Tag};

/// A GSUB or GPOS table, reduced to its FeatureList and FeatureVariations.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTable {
    pub tag: Tag,
    pub version: MajorMinor,
    pub feature_list: Vec<FeatureRecord>,
    pub feature_variations: Option<FeatureVariations>,
}

impl LayoutTable {
    pub fn new(tag: Tag, feature_list: Vec<FeatureRecord>) -> Self {
        Self { tag, version: MajorMinor::VERSION_1_0, feature_list, feature_variations: None }
    }

    /// Attach a FeatureVariations table, bumping the version to 1.1.
    pub fn with_feature_variations(mut self, feature_variations: FeatureVariations) -> Self {
        self.version = MajorMinor::VERSION_1_1;
        self.feature_variations = Some(feature_variations);
        self
    }

    pub fn feature(&self, index: u16) -> Option<&Feature> {
        self.feature_list.get(index as usize).map(|record| &record.feature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub tag: Tag,
    pub feature: Feature,
}

impl FeatureRecord {
    pub fn new(tag: Tag, lookup_indices: impl Into<Vec<u16>>) -> Self {
        Self { tag, feature: Feature::new(lookup_indices) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feature {
    pub lookup_indices: Vec<u16>,
}

impl Feature {
    pub fn new(lookup_indices: impl Into<Vec<u16>>) -> Self {
        Self { lookup_indices: lookup_indices.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVariations {
    pub version: MajorMinor,
    pub records: Vec<FeatureVariationRecord>,
}

impl FeatureVariations {
    pub fn new(records: Vec<FeatureVariationRecord>) -> Self {
        Self { version: MajorMinor::VERSION_1_0, records }
    }
}

/// Substitutions that take effect where every condition of the set holds.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVariationRecord {
    pub condition_set: ConditionSet,
    pub feature_table_substitution: FeatureTableSubstitution,
}

impl FeatureVariationRecord {
    pub fn new(
        conditions: Vec<Condition>,
        substitutions: Vec<FeatureTableSubstitutionRecord>,
    ) -> Self {
        Self {
            condition_set: ConditionSet { conditions },
            feature_table_substitution: FeatureTableSubstitution::new(substitutions),
        }
    }
}

/// Conditions combined with AND. An empty set always matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    AxisRange(ConditionFormat1),
    /// A condition format this crate does not interpret.
    Unsupported { format: u16 },
}

impl Condition {
    pub fn axis_range(axis_index: u16, min: f64, max: f64) -> Self {
        Self::AxisRange(ConditionFormat1 {
            axis_index,
            filter_range_min_value: F2Dot14::from_f32(min as f32),
            filter_range_max_value: F2Dot14::from_f32(max as f32),
        })
    }

    pub fn format(&self) -> u16 {
        match self {
            Self::AxisRange(_) => 1,
            Self::Unsupported { format } => *format,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AxisRange(c) => write!(
                f,
                "axis {} in [{}, {}]",
                c.axis_index,
                c.filter_range_min_value.to_f32(),
                c.filter_range_max_value.to_f32()
            ),
            Self::Unsupported { format } => write!(f, "format {format}"),
        }
    }
}

/// Axis range condition. Values are normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionFormat1 {
    pub axis_index: u16,
    pub filter_range_min_value: F2Dot14,
    pub filter_range_max_value: F2Dot14,
}

impl ConditionFormat1 {
    pub fn min(&self) -> f64 {
        f64::from(self.filter_range_min_value.to_f32())
    }

    pub fn max(&self) -> f64 {
        f64::from(self.filter_range_max_value.to_f32())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTableSubstitution {
    pub version: MajorMinor,
    pub substitutions: Vec<FeatureTableSubstitutionRecord>,
}

impl FeatureTableSubstitution {
    pub fn new(substitutions: Vec<FeatureTableSubstitutionRecord>) -> Self {
        Self { version: MajorMinor::VERSION_1_0, substitutions }
    }
}

/// Replace the feature at `feature_index` with `alternate_feature`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTableSubstitutionRecord {
    pub feature_index: u16,
    pub alternate_feature: Feature,
}

impl FeatureTableSubstitutionRecord {
    pub fn new(feature_index: u16, lookup_indices: impl Into<Vec<u16>>) -> Self {
        Self { feature_index, alternate_feature: Feature::new(lookup_indices) }
    }
}

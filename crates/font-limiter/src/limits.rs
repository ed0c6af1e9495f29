//! Axis limits: the new range (or pinned point) of each restricted axis.

use std::{collections::BTreeMap, fmt, str::FromStr};

use read_fonts::types::Tag;

use crate::error::{Error, Result};

/// New range of one axis, expressed in the axis' current normalized
/// coordinates.
///
/// Invariant: `-1 <= minimum <= default <= maximum <= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimit {
    pub minimum: f64,
    pub default: f64,
    pub maximum: f64,
}

impl AxisLimit {
    /// The full, unrestricted normalized range.
    pub const DEFAULT: Self = Self { minimum: -1.0, default: 0.0, maximum: 1.0 };

    pub fn new(minimum: f64, default: f64, maximum: f64) -> Result<Self> {
        let limit = Self { minimum, default, maximum };
        if limit.is_valid() {
            Ok(limit)
        } else {
            Err(Error::InvalidAxisLimit { min: minimum, default, max: maximum })
        }
    }

    /// A limit that pins the axis at `value`.
    pub fn pinned(value: f64) -> Result<Self> {
        Self::new(value, value, value)
    }

    pub fn is_valid(&self) -> bool {
        -1.0 <= self.minimum
            && self.minimum <= self.default
            && self.default <= self.maximum
            && self.maximum <= 1.0
    }

    pub fn is_pinned(&self) -> bool {
        self.minimum == self.default && self.default == self.maximum
    }

    /// Mirror the limit around zero.
    pub(crate) fn reverse_negate(self) -> Self {
        Self { minimum: -self.maximum, default: -self.default, maximum: -self.minimum }
    }
}

impl Default for AxisLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for AxisLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pinned() {
            write!(f, "{}", self.default)
        } else {
            write!(f, "{}:{}:{}", self.minimum, self.default, self.maximum)
        }
    }
}

/// Normalized limits for a set of axes, keyed by axis tag.
///
/// Axes without an entry keep their full range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisLimits(BTreeMap<Tag, AxisLimit>);

impl AxisLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Tag, limit: AxisLimit) -> Option<AxisLimit> {
        self.0.insert(tag, limit)
    }

    pub fn get(&self, tag: Tag) -> Option<&AxisLimit> {
        self.0.get(&tag)
    }

    /// The limit for `tag`, or the full range if the axis is not limited.
    pub fn get_or_default(&self, tag: Tag) -> AxisLimit {
        self.0.get(&tag).copied().unwrap_or_default()
    }

    /// Axes pinned to a single value, with that value.
    pub fn pinned_location(&self) -> BTreeMap<Tag, f64> {
        self.0
            .iter()
            .filter(|(_, limit)| limit.is_pinned())
            .map(|(tag, limit)| (*tag, limit.default))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, &AxisLimit)> {
        self.0.iter().map(|(tag, limit)| (*tag, limit))
    }
}

impl FromIterator<(Tag, AxisLimit)> for AxisLimits {
    fn from_iter<I: IntoIterator<Item = (Tag, AxisLimit)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An axis limit in user-space coordinates (design units as seen in `fvar`).
///
/// A missing default means "the axis default, clamped into the new range".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserAxisLimit {
    pub tag: Tag,
    pub minimum: f64,
    pub default: Option<f64>,
    pub maximum: f64,
}

impl UserAxisLimit {
    /// Pin `tag` at `value`.
    ///
    /// # Example
    ///
    /// ```
    /// use font_limiter::UserAxisLimit;
    /// let limit = UserAxisLimit::pin("wght", 700.0);
    /// assert!(limit.is_pinned());
    /// ```
    pub fn pin(tag: &str, value: f64) -> Self {
        Self { tag: make_tag(tag), minimum: value, default: Some(value), maximum: value }
    }

    /// Restrict `tag` to `minimum..=maximum`.
    pub fn range(tag: &str, minimum: f64, maximum: f64) -> Self {
        Self { tag: make_tag(tag), minimum, default: None, maximum }
    }

    /// Restrict `tag` to `minimum..=maximum` with a new default.
    pub fn with_default(tag: &str, minimum: f64, default: f64, maximum: f64) -> Self {
        Self { tag: make_tag(tag), minimum, default: Some(default), maximum }
    }

    pub fn is_pinned(&self) -> bool {
        self.minimum == self.maximum
    }
}

impl FromStr for UserAxisLimit {
    type Err = Error;

    /// Parse `TAG=VALUE`, `TAG=MIN:MAX` or `TAG=MIN:DEFAULT:MAX`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidLimitSpec(s.to_string());

        let (tag, values) = s.split_once('=').ok_or_else(invalid)?;
        if tag.is_empty() || tag.len() > 4 || !tag.is_ascii() {
            return Err(invalid());
        }

        let values = values
            .split(':')
            .map(|v| v.trim().parse::<f64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;

        let limit = match values[..] {
            [value] => Self::pin(tag, value),
            [min, max] => Self::range(tag, min, max),
            [min, default, max] => Self::with_default(tag, min, default, max),
            _ => return Err(invalid()),
        };

        let ordered = limit.minimum <= limit.maximum
            && limit.default.is_none_or(|d| limit.minimum <= d && d <= limit.maximum);
        if !ordered {
            return Err(invalid());
        }

        Ok(limit)
    }
}

fn make_tag(tag: &str) -> Tag {
    let mut tag_bytes = [b' '; 4];
    for (dst, src) in tag_bytes.iter_mut().zip(tag.as_bytes().iter()) {
        *dst = *src;
    }
    Tag::new(&tag_bytes)
}

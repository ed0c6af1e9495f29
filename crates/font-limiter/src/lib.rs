//! # Font Limiter
//!
//! Restrict the axes of a variable font to a narrower range, or pin them to a
//! single location.
//!
//! A Rust port of the axis-limiting parts of fonttools varLib.instancer:
//!
//! - [`rebase_tent`] re-expresses a variation region over a narrowed axis as
//!   a weighted sum of regions over the new axis range.
//! - [`instantiate_feature_variations`] rewrites the FeatureVariations of a
//!   GSUB or GPOS table for the new ranges.
//!
//! ## Example
//!
//! ```no_run
//! use font_limiter::{AxisLimits, UserAxisLimit, limit_feature_variations};
//! use read_fonts::FontRef;
//!
//! let data = std::fs::read("variable.ttf").unwrap();
//! let font = FontRef::new(&data).unwrap();
//! let limits = AxisLimits::from_user(
//!     &font,
//!     &[UserAxisLimit::range("wght", 300.0, 700.0), UserAxisLimit::pin("wdth", 100.0)],
//! )
//! .unwrap();
//!
//! let layout = limit_feature_variations(&data, &limits).unwrap();
//! for table in layout.tables() {
//!     println!("{}: {:?}", table.tag, table.feature_variations);
//! }
//! ```
//!
//! Rebasing a single region:
//!
//! ```
//! use font_limiter::{AxisLimit, Tent, rebase_tent};
//!
//! // Cut the axis at half its positive range
//! let limit = AxisLimit::new(-1.0, 0.0, 0.5).unwrap();
//! let pieces = rebase_tent(Tent::new(0.0, 1.0, 1.0), limit);
//! assert_eq!(pieces, vec![(0.5, Tent::new(0.0, 1.0, 1.0))]);
//! ```

mod error;
mod feature_vars;
mod font;
mod layout;
mod limits;
mod model;
mod solver;
mod tuple;

pub use error::{Error, Result};
pub use feature_vars::instantiate_feature_variations;
pub use font::{
    LimitedLayout, fvar_axes, hvar_regions, limit_feature_variations, limit_hvar_regions,
};
pub use layout::{
    Condition, ConditionFormat1, ConditionSet, Feature, FeatureRecord, FeatureTableSubstitution,
    FeatureTableSubstitutionRecord, FeatureVariationRecord, FeatureVariations, LayoutTable,
};
pub use limits::{AxisLimit, AxisLimits, UserAxisLimit};
pub use model::{MAX_F2DOT14, Tent, normalize_value, support_scalar};
pub use solver::{Decomposition, TentSolver, rebase_tent};
pub use tuple::{TupleVariation, change_tuple_axis_limit, limit_tuple_variations};

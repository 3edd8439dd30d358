use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Amenity, Category};

/// Upper price bound meaning "no maximum"
pub const PRICE_MAX_OPEN: i64 = 100_000_000;

/// Search criteria shared by every source
///
/// An empty set on any dimension means the dimension is unconstrained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CanonicalFilter {
    /// Town or area fragments, any of which may match
    pub locations: BTreeSet<String>,
    pub categories: BTreeSet<Category>,
    pub price_min: i64,
    /// `PRICE_MAX_OPEN` when there is no upper bound
    pub price_max: i64,
    /// Each value is an independent "at least N" threshold
    pub bedrooms_at_least: BTreeSet<u32>,
    pub bathrooms_at_least: BTreeSet<u32>,
    pub amenities: BTreeSet<Amenity>,
    /// Canonical feature tags, e.g. `Views - Sea`
    pub feature_tags: BTreeSet<String>,
}

impl Default for CanonicalFilter {
    fn default() -> Self {
        Self {
            locations: BTreeSet::new(),
            categories: BTreeSet::new(),
            price_min: 0,
            price_max: PRICE_MAX_OPEN,
            bedrooms_at_least: BTreeSet::new(),
            bathrooms_at_least: BTreeSet::new(),
            amenities: BTreeSet::new(),
            feature_tags: BTreeSet::new(),
        }
    }
}

impl CanonicalFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        let trimmed = location.trim();
        if !trimmed.is_empty() {
            self.locations.insert(trimmed.to_string());
        }
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.insert(category);
        self
    }

    pub fn with_price_range(mut self, min: i64, max: i64) -> Self {
        self.price_min = min.max(0);
        self.price_max = max;
        self
    }

    pub fn with_bedrooms_at_least(mut self, n: u32) -> Self {
        self.bedrooms_at_least.insert(n);
        self
    }

    pub fn with_bathrooms_at_least(mut self, n: u32) -> Self {
        self.bathrooms_at_least.insert(n);
        self
    }

    pub fn with_amenity(mut self, amenity: Amenity) -> Self {
        self.amenities.insert(amenity);
        self
    }

    pub fn with_feature_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let trimmed = tag.trim();
        if !trimmed.is_empty() {
            self.feature_tags.insert(trimmed.to_string());
        }
        self
    }

    /// True when the upper price bound is below the open-ended sentinel.
    pub fn has_price_max(&self) -> bool {
        self.price_max < PRICE_MAX_OPEN
    }

    /// True when the category selection is exactly "new development".
    pub fn only_new_development(&self) -> bool {
        self.categories.len() == 1 && self.categories.contains(&Category::NewDevelopment)
    }

    /// True when no dimension carries a constraint.
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }
}

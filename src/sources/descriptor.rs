use std::collections::BTreeSet;

use super::dialect::Dialect;
use super::types::{OrderKind, SourceOrder};
use crate::models::{Domain, SortKey};

/// Role a source plays in its domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Resale,
    NewDevelopment,
    Rental,
}

/// Filter dimensions a source may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Location,
    Category,
    Price,
    Bedrooms,
    Bathrooms,
    Amenities,
    FeatureTags,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Self::Location,
        Self::Category,
        Self::Price,
        Self::Bedrooms,
        Self::Bathrooms,
        Self::Amenities,
        Self::FeatureTags,
    ];
}

/// How a source encodes surface area
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeEncoding {
    /// One numeric field holding the built size
    Single(String),
    /// Separate built/plot/terrace fields
    Structured {
        built: String,
        plot: String,
        terrace: String,
    },
}

impl SizeEncoding {
    pub fn built_field(&self) -> &str {
        match self {
            Self::Single(field) => field,
            Self::Structured { built, .. } => built,
        }
    }
}

/// Field names of one source, keyed by canonical concept
#[derive(Debug, Clone)]
pub struct FieldMap {
    pub location: String,
    pub location_secondary: Option<String>,
    pub category: String,
    pub price: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub tags: String,
    pub updated: String,
    pub size: SizeEncoding,
    pub title: Option<String>,
    pub description: String,
    pub images: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl FieldMap {
    /// Location fields in match order: primary first.
    pub fn location_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.location.as_str()).chain(self.location_secondary.as_deref())
    }
}

/// Static metadata about one record source
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub name: String,
    pub kind: SourceKind,
    pub domain: Domain,
    pub identity_field: String,
    pub fields: FieldMap,
    pub supported: BTreeSet<Dimension>,
    pub dialect: Dialect,
    /// Whether the source can order and window natively
    pub supports_push_down: bool,
}

impl SourceDescriptor {
    pub fn supports(&self, dimension: Dimension) -> bool {
        self.supported.contains(&dimension)
    }

    /// Translate a canonical sort key into this source's field names.
    pub fn order_for(&self, sort: SortKey) -> SourceOrder {
        let (field, kind, descending) = match sort {
            SortKey::PriceAsc => (self.fields.price.as_str(), OrderKind::Numeric, false),
            SortKey::PriceDesc => (self.fields.price.as_str(), OrderKind::Numeric, true),
            SortKey::SizeAsc => (self.fields.size.built_field(), OrderKind::Numeric, false),
            SortKey::SizeDesc => (self.fields.size.built_field(), OrderKind::Numeric, true),
            SortKey::RecentlyUpdated => (self.fields.updated.as_str(), OrderKind::Timestamp, true),
        };
        SourceOrder {
            field: field.to_string(),
            kind,
            descending,
        }
    }
}

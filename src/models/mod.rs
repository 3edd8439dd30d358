pub mod filter;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use filter::{CanonicalFilter, PRICE_MAX_OPEN};

/// Market segment a search runs against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Sale,
    Rental,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Rental => "rental",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sale" => Some(Self::Sale),
            "rental" | "rent" => Some(Self::Rental),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical property category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Apartment,
    Penthouse,
    House,
    Townhouse,
    Plot,
    Commercial,
    NewDevelopment,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Self::Apartment,
        Self::Penthouse,
        Self::House,
        Self::Townhouse,
        Self::Plot,
        Self::Commercial,
        Self::NewDevelopment,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::Penthouse => "penthouse",
            Self::House => "house",
            Self::Townhouse => "townhouse",
            Self::Plot => "plot",
            Self::Commercial => "commercial",
            Self::NewDevelopment => "new-development",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(slug))
    }
}

/// Boolean amenity a listing may offer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Amenity {
    Pool,
    Garden,
    Garage,
    Terrace,
    Lift,
    AirConditioning,
}

impl Amenity {
    pub const ALL: [Amenity; 6] = [
        Self::Pool,
        Self::Garden,
        Self::Garage,
        Self::Terrace,
        Self::Lift,
        Self::AirConditioning,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::Garden => "garden",
            Self::Garage => "garage",
            Self::Terrace => "terrace",
            Self::Lift => "lift",
            Self::AirConditioning => "air-conditioning",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.slug().eq_ignore_ascii_case(slug))
    }
}

/// Ordering applied to a result set
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    SizeAsc,
    SizeDesc,
    #[default]
    RecentlyUpdated,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::SizeAsc => "size_asc",
            Self::SizeDesc => "size_desc",
            Self::RecentlyUpdated => "recent",
        }
    }

    /// Unknown keys fall back to the default ordering.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "size_asc" => Self::SizeAsc,
            "size_desc" => Self::SizeDesc,
            _ => Self::RecentlyUpdated,
        }
    }
}

/// Map position of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Surface areas in square meters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AreaBreakdown {
    pub built: Option<f64>,
    pub plot: Option<f64>,
    pub terrace: Option<f64>,
}

/// Canonical listing produced from any source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: String,
    pub source_id: String,
    pub domain: Domain,
    pub title: String,
    pub price: Option<i64>,
    pub size: AreaBreakdown,
    pub listed_at: Option<DateTime<Utc>>,
    pub town: Option<String>,
    pub area: Option<String>,
    pub property_type: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub description: String,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub coordinates: Option<Coordinates>,
}

impl Listing {
    /// Price used for ordering; a missing price counts as zero.
    pub fn sort_price(&self) -> i64 {
        self.price.unwrap_or(0)
    }

    /// Built size used for ordering; a missing size counts as zero.
    pub fn sort_size(&self) -> f64 {
        self.size.built.unwrap_or(0.0)
    }
}

//! Built-in descriptors for the resale, new-development and rental collections

use std::collections::BTreeMap;

use super::descriptor::{Dimension, FieldMap, SizeEncoding, SourceDescriptor, SourceKind};
use super::dialect::{AmenityBinding, Dialect, TagDialect, TagStyle};
use crate::models::{Amenity, Category, Domain};

fn labels<const N: usize>(entries: [(Category, &[&str]); N]) -> BTreeMap<Category, Vec<String>> {
    entries
        .into_iter()
        .map(|(category, names)| (category, names.iter().map(|s| s.to_string()).collect()))
        .collect()
}

fn flag(field: &str) -> AmenityBinding {
    AmenityBinding::Flag(field.to_string())
}

fn tag(canonical: &str) -> AmenityBinding {
    AmenityBinding::Tag(canonical.to_string())
}

/// Resale listings: the original single-table sale collection
pub fn resale() -> SourceDescriptor {
    SourceDescriptor {
        name: "resale".to_string(),
        kind: SourceKind::Resale,
        domain: Domain::Sale,
        identity_field: "ref".to_string(),
        fields: FieldMap {
            location: "town".to_string(),
            location_secondary: Some("area".to_string()),
            category: "type".to_string(),
            price: "price".to_string(),
            bedrooms: "beds".to_string(),
            bathrooms: "baths".to_string(),
            tags: "features".to_string(),
            updated: "updated".to_string(),
            size: SizeEncoding::Single("built_m2".to_string()),
            title: Some("name".to_string()),
            description: "description".to_string(),
            images: "pictures".to_string(),
            latitude: Some("lat".to_string()),
            longitude: Some("lng".to_string()),
        },
        supported: Dimension::ALL.into_iter().collect(),
        dialect: Dialect {
            tags: TagDialect::new([TagStyle::Dashed])
                .with_override("Setting - Beachfront", ["Setting - Beach Front"]),
            categories: labels([
                (Category::Apartment, &["Apartment", "Flat"]),
                (Category::Penthouse, &["Penthouse"]),
                (Category::House, &["House", "Villa", "Detached"]),
                (Category::Townhouse, &["Townhouse", "Semi-Detached"]),
                (Category::Plot, &["Plot", "Land"]),
                (Category::Commercial, &["Commercial", "Office", "Shop"]),
            ]),
            amenities: BTreeMap::from([
                (Amenity::Pool, flag("pool")),
                (Amenity::Garage, flag("garage")),
                (Amenity::Garden, tag("Garden - Private")),
                (Amenity::Terrace, tag("Features - Terrace")),
                (Amenity::Lift, tag("Features - Lift")),
                (Amenity::AirConditioning, tag("Climate Control - Air Conditioning")),
            ]),
        },
        supports_push_down: true,
    }
}

/// New-development promotions, fetched whole and merged with resale
pub fn new_development() -> SourceDescriptor {
    SourceDescriptor {
        name: "new_development".to_string(),
        kind: SourceKind::NewDevelopment,
        domain: Domain::Sale,
        identity_field: "id".to_string(),
        fields: FieldMap {
            location: "location".to_string(),
            location_secondary: Some("zone".to_string()),
            category: "property_types".to_string(),
            price: "price_from".to_string(),
            bedrooms: "bedrooms_min".to_string(),
            bathrooms: "bathrooms_min".to_string(),
            tags: "tags".to_string(),
            updated: "listed_at".to_string(),
            size: SizeEncoding::Structured {
                built: "size.built".to_string(),
                plot: "size.plot".to_string(),
                terrace: "size.terrace".to_string(),
            },
            title: Some("development_name".to_string()),
            description: "summary".to_string(),
            images: "gallery".to_string(),
            latitude: Some("geo.lat".to_string()),
            longitude: Some("geo.lng".to_string()),
        },
        supported: Dimension::ALL.into_iter().collect(),
        dialect: Dialect {
            tags: TagDialect::new([TagStyle::Colon, TagStyle::Dashed]),
            categories: labels([
                (Category::Apartment, &["Apartment"]),
                (Category::Penthouse, &["Penthouse"]),
                (Category::House, &["Villa", "House"]),
                (Category::Townhouse, &["Townhouse"]),
            ]),
            amenities: BTreeMap::from([
                (Amenity::Pool, tag("Pool - Communal")),
                (Amenity::Garden, tag("Garden - Private")),
                (Amenity::Garage, tag("Parking - Garage")),
                (Amenity::Terrace, tag("Features - Terrace")),
                (Amenity::Lift, tag("Features - Lift")),
                (Amenity::AirConditioning, tag("Climate Control - Air Conditioning")),
            ]),
        },
        supports_push_down: false,
    }
}

/// Long-term rentals
pub fn rental() -> SourceDescriptor {
    SourceDescriptor {
        name: "rental".to_string(),
        kind: SourceKind::Rental,
        domain: Domain::Rental,
        identity_field: "reference".to_string(),
        fields: FieldMap {
            location: "town".to_string(),
            location_secondary: Some("area".to_string()),
            category: "type".to_string(),
            price: "longterm_price".to_string(),
            bedrooms: "bedrooms".to_string(),
            bathrooms: "bathrooms".to_string(),
            tags: "features".to_string(),
            updated: "updated_at".to_string(),
            size: SizeEncoding::Single("m2".to_string()),
            title: None,
            description: "description".to_string(),
            images: "images".to_string(),
            latitude: None,
            longitude: None,
        },
        supported: [
            Dimension::Location,
            Dimension::Category,
            Dimension::Price,
            Dimension::Bedrooms,
            Dimension::Amenities,
            Dimension::FeatureTags,
        ]
        .into_iter()
        .collect(),
        dialect: Dialect {
            tags: TagDialect::new([TagStyle::Bare, TagStyle::Dashed]),
            categories: labels([
                (Category::Apartment, &["Apartment", "Flat", "Studio"]),
                (Category::Penthouse, &["Penthouse"]),
                (Category::House, &["House", "Villa"]),
                (Category::Townhouse, &["Townhouse"]),
            ]),
            amenities: BTreeMap::from([
                (Amenity::Pool, flag("pool")),
                (Amenity::Garage, flag("garage")),
                (Amenity::Garden, tag("Garden - Private")),
                (Amenity::Terrace, tag("Features - Terrace")),
                (Amenity::Lift, tag("Features - Lift")),
                (Amenity::AirConditioning, tag("Climate Control - Air Conditioning")),
            ]),
        },
        supports_push_down: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortKey;
    use crate::sources::types::OrderKind;

    #[test]
    fn test_house_maps_to_villa_labels() {
        assert!(resale()
            .dialect
            .category_labels(Category::House)
            .contains(&"Villa".to_string()));
        assert!(new_development()
            .dialect
            .category_labels(Category::House)
            .contains(&"Villa".to_string()));
        assert!(rental().dialect.category_labels(Category::Plot).is_empty());
    }

    #[test]
    fn test_order_uses_source_fields() {
        let order = new_development().order_for(SortKey::SizeDesc);
        assert_eq!(order.field, "size.built");
        assert!(order.descending);

        let order = rental().order_for(SortKey::RecentlyUpdated);
        assert_eq!(order.field, "updated_at");
        assert_eq!(order.kind, OrderKind::Timestamp);
    }

    #[test]
    fn test_push_down_capabilities() {
        assert!(resale().supports_push_down);
        assert!(!new_development().supports_push_down);
        assert!(rental().supports_push_down);
        assert!(!rental().supports(Dimension::Bathrooms));
    }
}

//! Canonical filter -> source predicate
//!
//! One compile per source, since each source names and spells things
//! differently. Values a source has no vocabulary for are dropped for that
//! source (no-op), never turned into "match nothing".

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::Predicate;
use crate::config::{SearchConfig, MAX_RENTAL_RECENCY_DAYS};
use crate::models::{Category, CanonicalFilter, Domain};
use crate::sources::{AmenityBinding, Dimension, SourceDescriptor, SourceKind};

/// Domain rules applied on top of user criteria
#[derive(Debug, Clone)]
pub struct CompilePolicy {
    /// Minimum sale price regardless of the requested minimum
    pub sale_price_floor: i64,
    /// Minimum long-term rental price; zero-priced rentals are always excluded
    pub rental_price_floor: i64,
    pub rental_recency: Duration,
    pub now: DateTime<Utc>,
}

impl CompilePolicy {
    pub fn from_config(config: &SearchConfig, now: DateTime<Utc>) -> Self {
        Self {
            sale_price_floor: config.sale_price_floor,
            rental_price_floor: config.rental_price_floor,
            // Configs built in code skip validation
            rental_recency: Duration::days(
                config.rental_recency_days.clamp(0, MAX_RENTAL_RECENCY_DAYS),
            ),
            now,
        }
    }
}

/// Outcome of compiling a filter for one source
#[derive(Debug, Clone, PartialEq)]
pub enum Compiled {
    Query(Predicate),
    /// The filter routes the whole search away from this source
    Skip,
}

pub fn compile(
    filter: &CanonicalFilter,
    source: &SourceDescriptor,
    policy: &CompilePolicy,
) -> Compiled {
    // "New development" alone is answered by the new-development source only
    if source.kind == SourceKind::Resale && filter.only_new_development() {
        debug!("{}: skipped, filter selects new developments only", source.name);
        return Compiled::Skip;
    }

    let mut clauses = Vec::new();

    if source.supports(Dimension::Location) {
        clauses.push(location_clause(filter, source));
    }
    if source.supports(Dimension::Category) {
        clauses.push(category_clause(filter, source));
    }
    if source.supports(Dimension::Price) {
        clauses.extend(price_clauses(filter, source, policy));
    }
    if source.supports(Dimension::Bedrooms) {
        clauses.push(rooms_clause(&filter.bedrooms_at_least, &source.fields.bedrooms));
    }
    if source.supports(Dimension::Bathrooms) {
        clauses.push(rooms_clause(&filter.bathrooms_at_least, &source.fields.bathrooms));
    }
    if source.supports(Dimension::Amenities) {
        clauses.push(amenities_clause(filter, source));
    }
    if source.supports(Dimension::FeatureTags) {
        clauses.push(feature_tags_clause(filter, source));
    }
    if source.domain == Domain::Rental {
        clauses.extend(rental_defaults(source, policy));
    }

    let predicate = Predicate::all_of(clauses);
    debug!("{}: WHERE {}", source.name, predicate);
    Compiled::Query(predicate)
}

/// Every location value against every location field, OR'd.
fn location_clause(filter: &CanonicalFilter, source: &SourceDescriptor) -> Predicate {
    Predicate::any_of(filter.locations.iter().flat_map(move |needle| {
        source
            .fields
            .location_fields()
            .map(move |field| Predicate::Contains {
                field: field.to_string(),
                needle: needle.clone(),
            })
    }))
}

fn category_clause(filter: &CanonicalFilter, source: &SourceDescriptor) -> Predicate {
    // Every promotion is a new development, so the category adds nothing here
    if source.kind == SourceKind::NewDevelopment
        && filter.categories.contains(&Category::NewDevelopment)
    {
        return Predicate::All;
    }

    let field = &source.fields.category;
    let patterns: Vec<Predicate> = filter
        .categories
        .iter()
        .flat_map(move |c| source.dialect.category_labels(*c))
        .map(|label| Predicate::IsLabel {
            field: field.clone(),
            label: label.clone(),
        })
        .collect();

    if patterns.is_empty() && !filter.categories.is_empty() {
        debug!(
            "{}: no labels for categories {:?}, category ignored",
            source.name, filter.categories
        );
    }
    Predicate::any_of(patterns)
}

fn price_clauses(
    filter: &CanonicalFilter,
    source: &SourceDescriptor,
    policy: &CompilePolicy,
) -> Vec<Predicate> {
    let field = &source.fields.price;
    let mut out = Vec::new();

    let min = match source.domain {
        Domain::Sale => filter.price_min.max(policy.sale_price_floor),
        Domain::Rental => filter.price_min,
    };
    if min > 0 {
        out.push(Predicate::AtLeast {
            field: field.clone(),
            value: min,
        });
    }
    if filter.has_price_max() {
        out.push(Predicate::AtMost {
            field: field.clone(),
            value: filter.price_max,
        });
    }
    out
}

/// Each threshold is its own "at least N" clause, OR'd together.
///
/// A zero threshold accepts anything, so it removes the constraint.
fn rooms_clause(thresholds: &std::collections::BTreeSet<u32>, field: &str) -> Predicate {
    if thresholds.contains(&0) {
        return Predicate::All;
    }
    Predicate::any_of(thresholds.iter().map(|n| Predicate::AtLeast {
        field: field.to_string(),
        value: i64::from(*n),
    }))
}

fn tag_membership(source: &SourceDescriptor, canonical: &str) -> Predicate {
    let field = &source.fields.tags;
    Predicate::any_of(
        source
            .dialect
            .tags
            .spellings(canonical)
            .into_iter()
            .map(|tag| Predicate::HasTag {
                field: field.clone(),
                tag,
            }),
    )
}

/// Every requested amenity must be present.
///
/// Tag-bound amenities go through the same spelling expansion as feature tags.
fn amenities_clause(filter: &CanonicalFilter, source: &SourceDescriptor) -> Predicate {
    Predicate::all_of(filter.amenities.iter().map(|amenity| {
        match source.dialect.amenities.get(amenity) {
            Some(AmenityBinding::Flag(field)) => Predicate::IsTrue {
                field: field.clone(),
            },
            Some(AmenityBinding::Tag(canonical)) => tag_membership(source, canonical),
            None => {
                debug!("{}: amenity {:?} not recorded, ignored", source.name, amenity);
                Predicate::All
            }
        }
    }))
}

/// Every requested tag must be present in at least one of its spellings.
fn feature_tags_clause(filter: &CanonicalFilter, source: &SourceDescriptor) -> Predicate {
    Predicate::all_of(
        filter
            .feature_tags
            .iter()
            .map(|tag| tag_membership(source, tag)),
    )
}

/// Rules every rental search carries, whatever the user asked for.
fn rental_defaults(source: &SourceDescriptor, policy: &CompilePolicy) -> Vec<Predicate> {
    vec![
        Predicate::AtLeast {
            field: source.fields.price.clone(),
            value: policy.rental_price_floor.max(1),
        },
        Predicate::UpdatedSince {
            field: source.fields.updated.clone(),
            since: policy
                .now
                .checked_sub_signed(policy.rental_recency)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Amenity;
    use crate::sources::{catalog, RawRecord};
    use serde_json::json;

    fn policy() -> CompilePolicy {
        CompilePolicy::from_config(&SearchConfig::default(), Utc::now())
    }

    fn predicate(filter: &CanonicalFilter, source: &SourceDescriptor) -> Predicate {
        match compile(filter, source, &policy()) {
            Compiled::Query(p) => p,
            Compiled::Skip => panic!("source unexpectedly skipped"),
        }
    }

    #[test]
    fn test_empty_filter_only_carries_sale_floor() {
        let p = predicate(&CanonicalFilter::new(), &catalog::resale());
        assert_eq!(
            p,
            Predicate::AtLeast {
                field: "price".to_string(),
                value: 150_000
            }
        );
    }

    #[test]
    fn test_requested_min_above_floor_wins() {
        let filter = CanonicalFilter::new().with_price_range(400_000, 900_000);
        let p = predicate(&filter, &catalog::resale());
        assert_eq!(
            p,
            Predicate::And(vec![
                Predicate::AtLeast {
                    field: "price".to_string(),
                    value: 400_000
                },
                Predicate::AtMost {
                    field: "price".to_string(),
                    value: 900_000
                },
            ])
        );
    }

    #[test]
    fn test_location_matches_either_field() {
        let filter = CanonicalFilter::new()
            .with_location("Marbella")
            .with_location("Nueva Andalucia");
        let source = catalog::resale();
        let p = predicate(&filter, &source);

        let in_area = RawRecord::new(json!({"town": "Marbella", "area": "Nueva Andalucía", "price": 200_000}));
        let by_area = RawRecord::new(json!({"town": "Benahavis", "area": "Nueva Andalucia", "price": 200_000}));
        let elsewhere = RawRecord::new(json!({"town": "Estepona", "area": "Centro", "price": 200_000}));
        assert!(p.matches(&in_area));
        assert!(p.matches(&by_area));
        assert!(!p.matches(&elsewhere));
    }

    #[test]
    fn test_house_matches_villa_label() {
        let filter = CanonicalFilter::new().with_category(Category::House);
        let p = predicate(&filter, &catalog::resale());
        let villa = RawRecord::new(json!({"type": "Villa", "price": 500_000}));
        let flat = RawRecord::new(json!({"type": "Apartment", "price": 500_000}));
        assert!(p.matches(&villa));
        assert!(!p.matches(&flat));
    }

    #[test]
    fn test_house_excludes_penthouse_and_townhouse() {
        let filter = CanonicalFilter::new().with_category(Category::House);
        let resale = predicate(&filter, &catalog::resale());
        for kind in ["Penthouse", "Townhouse", "Semi-Detached"] {
            let row = RawRecord::new(json!({"type": kind, "price": 500_000}));
            assert!(!resale.matches(&row), "{kind} matched a house filter");
        }
        assert!(resale.matches(&RawRecord::new(json!({"type": "house", "price": 500_000}))));

        let developments = predicate(&filter, &catalog::new_development());
        let penthouses = RawRecord::new(json!({"property_types": ["Penthouse"], "price_from": 900_000}));
        let mixed = RawRecord::new(json!({"property_types": ["Penthouse", "Villa"], "price_from": 900_000}));
        assert!(!developments.matches(&penthouses));
        assert!(developments.matches(&mixed));
    }

    #[test]
    fn test_unknown_category_for_source_is_noop() {
        let filter = CanonicalFilter::new().with_category(Category::Plot);
        let p = predicate(&filter, &catalog::rental());
        let record = RawRecord::new(json!({
            "type": "Apartment",
            "longterm_price": 1500,
            "updated_at": Utc::now().to_rfc3339(),
        }));
        assert!(p.matches(&record));
    }

    #[test]
    fn test_new_development_only_skips_resale() {
        let filter = CanonicalFilter::new().with_category(Category::NewDevelopment);
        assert_eq!(compile(&filter, &catalog::resale(), &policy()), Compiled::Skip);

        let p = predicate(&filter, &catalog::new_development());
        let promo = RawRecord::new(json!({"property_types": ["Plot"], "price_from": 300_000}));
        assert!(p.matches(&promo));
    }

    #[test]
    fn test_room_thresholds_are_or() {
        let filter = CanonicalFilter::new()
            .with_bedrooms_at_least(2)
            .with_bedrooms_at_least(4);
        let p = predicate(&filter, &catalog::resale());
        let two = RawRecord::new(json!({"beds": 2, "price": 200_000}));
        let one = RawRecord::new(json!({"beds": 1, "price": 200_000}));
        assert!(p.matches(&two));
        assert!(!p.matches(&one));

        let any = CanonicalFilter::new().with_bedrooms_at_least(0);
        assert!(predicate(&any, &catalog::resale()).matches(&one));
    }

    #[test]
    fn test_feature_tag_expands_per_source_spelling() {
        let filter = CanonicalFilter::new().with_feature_tag("Views - Sea");

        let dev = predicate(&filter, &catalog::new_development());
        let colon = RawRecord::new(json!({"tags": ["Views: Sea"], "price_from": 300_000}));
        assert!(dev.matches(&colon));

        let rent = predicate(&filter, &catalog::rental());
        let bare = RawRecord::new(json!({
            "features": ["Sea"],
            "longterm_price": 1500,
            "updated_at": Utc::now().to_rfc3339(),
        }));
        assert!(rent.matches(&bare));
    }

    #[test]
    fn test_tag_amenity_uses_dialect_expansion() {
        let filter = CanonicalFilter::new().with_amenity(Amenity::Garden);
        let p = predicate(&filter, &catalog::new_development());
        let colon = RawRecord::new(json!({"tags": ["Garden: Private"], "price_from": 300_000}));
        let none = RawRecord::new(json!({"tags": ["Pool: Communal"], "price_from": 300_000}));
        assert!(p.matches(&colon));
        assert!(!p.matches(&none));
    }

    #[test]
    fn test_flag_amenity() {
        let filter = CanonicalFilter::new().with_amenity(Amenity::Pool);
        let p = predicate(&filter, &catalog::resale());
        assert!(p.matches(&RawRecord::new(json!({"pool": true, "price": 200_000}))));
        assert!(!p.matches(&RawRecord::new(json!({"pool": false, "price": 200_000}))));
    }

    #[test]
    fn test_unsupported_dimension_ignored() {
        let filter = CanonicalFilter::new().with_bathrooms_at_least(3);
        let p = predicate(&filter, &catalog::rental());
        let record = RawRecord::new(json!({
            "bathrooms": 1,
            "longterm_price": 1500,
            "updated_at": Utc::now().to_rfc3339(),
        }));
        assert!(p.matches(&record));
    }

    #[test]
    fn test_rental_defaults_always_apply() {
        let p = predicate(&CanonicalFilter::new(), &catalog::rental());
        let now = Utc::now();
        let stale = RawRecord::new(json!({
            "longterm_price": 1200,
            "updated_at": (now - Duration::days(50)).to_rfc3339(),
        }));
        let cheap = RawRecord::new(json!({
            "longterm_price": 900,
            "updated_at": (now - Duration::days(10)).to_rfc3339(),
        }));
        let zero = RawRecord::new(json!({
            "longterm_price": 0,
            "updated_at": (now - Duration::days(1)).to_rfc3339(),
        }));
        let fresh = RawRecord::new(json!({
            "longterm_price": 1200,
            "updated_at": (now - Duration::days(10)).to_rfc3339(),
        }));
        assert!(!p.matches(&stale));
        assert!(!p.matches(&cheap));
        assert!(!p.matches(&zero));
        assert!(p.matches(&fresh));
    }

    #[test]
    fn test_oversized_recency_is_clamped() {
        let config = SearchConfig {
            rental_recency_days: i64::MAX,
            ..SearchConfig::default()
        };
        let now = Utc::now();
        let policy = CompilePolicy::from_config(&config, now);
        assert_eq!(policy.rental_recency, Duration::days(MAX_RENTAL_RECENCY_DAYS));

        let p = match compile(&CanonicalFilter::new(), &catalog::rental(), &policy) {
            Compiled::Query(p) => p,
            Compiled::Skip => panic!("rental source skipped"),
        };
        let old = RawRecord::new(json!({
            "longterm_price": 1500,
            "updated_at": (now - Duration::days(3_650)).to_rfc3339(),
        }));
        assert!(p.matches(&old));
    }

    #[test]
    fn test_sale_floor_not_applied_to_rentals() {
        let p = predicate(&CanonicalFilter::new(), &catalog::rental());
        assert!(!p.to_string().contains("150000"));
    }
}

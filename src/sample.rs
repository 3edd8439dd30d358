//! Demo inventory for the three built-in collections
//!
//! Rows are written in each collection's own shape, with timestamps relative
//! to `now` so the rental recency window always has something to cut.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::sources::{catalog, ListingSource, MemorySource};

fn days_ago(now: DateTime<Utc>, days: i64) -> String {
    (now - Duration::days(days)).to_rfc3339()
}

pub fn resale_rows(now: DateTime<Utc>) -> Vec<Value> {
    vec![
        json!({
            "ref": "R-1001",
            "name": "Frontline beach apartment",
            "town": "Marbella",
            "area": "Golden Mile",
            "type": "Apartment",
            "price": 895_000,
            "beds": 2,
            "baths": 2,
            "built_m2": 124,
            "pool": true,
            "garage": false,
            "features": r#"["Setting - Beach Front", "Views - Sea", "Features - Lift"]"#,
            "updated": days_ago(now, 3),
            "description": "Bright corner apartment on the beach with wraparound terrace.",
            "pictures": r#"["r1001-1.jpg", "r1001-2.jpg"]"#,
            "lat": 36.5071,
            "lng": -4.9224
        }),
        json!({
            "ref": "R-1002",
            "town": "Estepona",
            "area": "El Padrón",
            "type": "Villa",
            "price": "1 450 000",
            "beds": 4,
            "baths": 3,
            "built_m2": 310,
            "pool": true,
            "garage": true,
            "features": r#"["Garden - Private", "Views - Mountain", "Climate Control - Air Conditioning"]"#,
            "updated": days_ago(now, 20),
            "description": "Family villa with a private garden and mountain views."
        }),
        json!({
            "ref": "R-1003",
            "town": "Fuengirola",
            "type": "Studio",
            "price": 120_000,
            "beds": 0,
            "baths": 1,
            "built_m2": 38,
            "features": "[]",
            "updated": days_ago(now, 1),
            "description": "Compact studio close to the train station."
        }),
        json!({
            "ref": "R-1004",
            "town": "Marbella",
            "area": "Nueva Andalucía",
            "type": "Townhouse",
            "price": 575_000,
            "beds": 3,
            "baths": 2,
            "built_m2": 180,
            "features": r#"["Setting - Close To Golf", "Features - Terrace"]"#,
            "description": "Townhouse in the golf valley, walking distance to Puerto Banús."
        }),
        json!({
            "ref": "P1",
            "name": "Resale unit at Sierra Blanca Residences",
            "town": "Marbella",
            "area": "Sierra Blanca",
            "type": "Penthouse",
            "price": 2_100_000,
            "beds": 3,
            "baths": 3,
            "built_m2": 240,
            "pool": true,
            "features": r#"["Views - Sea", "Features - Terrace"]"#,
            "updated": days_ago(now, 7),
            "description": "Penthouse with a rooftop solarium."
        }),
    ]
}

pub fn new_development_rows(now: DateTime<Utc>) -> Vec<Value> {
    vec![
        json!({
            "id": "D-2001",
            "development_name": "Sea Pines",
            "location": "Mijas",
            "zone": "La Cala",
            "property_types": ["Apartment", "Penthouse"],
            "price_from": 385_000,
            "bedrooms_min": 2,
            "bathrooms_min": 2,
            "tags": ["Views: Sea", "Pool: Communal", "Features: Lift"],
            "size": {"built": 98, "terrace": 32},
            "listed_at": days_ago(now, 12),
            "summary": "Forty homes on the hillside above La Cala beach.",
            "gallery": ["seapines-1.jpg"],
            "geo": {"lat": 36.5167, "lng": -4.6833}
        }),
        json!({
            "id": "D-2002",
            "development_name": "Las Lomas Villas",
            "location": "Benahavís",
            "property_types": ["Villa"],
            "price_from": 1_950_000,
            "bedrooms_min": 4,
            "bathrooms_min": 4,
            "tags": ["Garden: Private", "Parking: Garage", "Views: Mountain"],
            "size": {"built": 420, "plot": 1500, "terrace": 120},
            "listed_at": days_ago(now, 40),
            "summary": "Eight contemporary villas in a gated valley."
        }),
        json!({
            "id": "P1",
            "development_name": "Sierra Blanca Residences",
            "location": "Marbella",
            "zone": "Sierra Blanca",
            "property_types": ["Penthouse"],
            "price_from": 1_990_000,
            "bedrooms_min": 3,
            "bathrooms_min": 3,
            "tags": ["Views: Sea"],
            "listed_at": days_ago(now, 30),
            "summary": "Duplicate of a resale listing; the resale copy wins."
        }),
    ]
}

pub fn rental_rows(now: DateTime<Utc>) -> Vec<Value> {
    vec![
        json!({
            "reference": "L-3001",
            "town": "Marbella",
            "area": "Old Town",
            "type": "Apartment",
            "longterm_price": 1_400,
            "bedrooms": 2,
            "bathrooms": 1,
            "m2": 85,
            "features": ["Terrace", "Lift"],
            "updated_at": days_ago(now, 5),
            "description": "Renovated flat a short walk from Orange Square."
        }),
        json!({
            "reference": "L-3002",
            "town": "Estepona",
            "type": "Villa",
            "longterm_price": 3_200,
            "bedrooms": 4,
            "bathrooms": 3,
            "pool": true,
            "features": ["Garden - Private", "Views - Sea"],
            "updated_at": days_ago(now, 10),
            "description": "Detached villa for a long-term let."
        }),
        json!({
            "reference": "L-3003",
            "town": "Fuengirola",
            "type": "Studio",
            "longterm_price": 900,
            "bedrooms": 0,
            "updated_at": days_ago(now, 2),
            "description": "Studio below the rental floor."
        }),
        json!({
            "reference": "L-3004",
            "town": "Benalmádena",
            "type": "Apartment",
            "longterm_price": 1_100,
            "bedrooms": 1,
            "updated_at": days_ago(now, 60),
            "description": "Not touched for two months."
        }),
    ]
}

/// All demo sources, resale registered ahead of new developments.
pub fn demo_sources(now: DateTime<Utc>) -> Vec<Arc<dyn ListingSource>> {
    let sources: Vec<Arc<dyn ListingSource>> = vec![
        Arc::new(MemorySource::from_json(catalog::resale(), resale_rows(now))),
        Arc::new(MemorySource::from_json(
            catalog::new_development(),
            new_development_rows(now),
        )),
        Arc::new(MemorySource::from_json(catalog::rental(), rental_rows(now))),
    ];
    info!("📋 Loaded {} demo sources", sources.len());
    sources
}

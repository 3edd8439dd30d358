//! Cross-source merge and the single ordering every result set uses

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{Listing, SortKey};

/// Concatenate per-source results in priority order, keeping the first copy of each id.
pub fn merge(per_source: Vec<Vec<Listing>>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(per_source.iter().map(Vec::len).sum());
    for listing in per_source.into_iter().flatten() {
        if seen.insert(listing.id.clone()) {
            out.push(listing);
        }
    }
    out
}

pub fn compare(a: &Listing, b: &Listing, sort: SortKey) -> Ordering {
    match sort {
        SortKey::PriceAsc => a.sort_price().cmp(&b.sort_price()),
        SortKey::PriceDesc => b.sort_price().cmp(&a.sort_price()),
        SortKey::SizeAsc => a.sort_size().total_cmp(&b.sort_size()),
        SortKey::SizeDesc => b.sort_size().total_cmp(&a.sort_size()),
        // Undated listings go last, keeping their relative order
        SortKey::RecentlyUpdated => match (a.listed_at, b.listed_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Stable sort; re-sorting an already sorted sequence leaves it unchanged.
pub fn sort_listings(listings: &mut [Listing], sort: SortKey) {
    listings.sort_by(|a, b| compare(a, b, sort));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AreaBreakdown, Domain};
    use chrono::{TimeZone, Utc};

    fn listing(id: &str, source: &str, price: Option<i64>, day: Option<u32>) -> Listing {
        Listing {
            id: id.to_string(),
            source_id: source.to_string(),
            domain: Domain::Sale,
            title: id.to_string(),
            price,
            size: AreaBreakdown {
                built: price.map(|p| p as f64 / 1_000.0),
                ..AreaBreakdown::default()
            },
            listed_at: day.map(|d| Utc.with_ymd_and_hms(2026, 10, d, 0, 0, 0).unwrap()),
            town: None,
            area: None,
            property_type: None,
            bedrooms: None,
            bathrooms: None,
            description: String::new(),
            features: Vec::new(),
            images: Vec::new(),
            coordinates: None,
        }
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_merge_keeps_first_source_copy() {
        let merged = merge(vec![
            vec![listing("P1", "resale", Some(200_000), None)],
            vec![
                listing("P1", "new_development", Some(300_000), None),
                listing("P2", "new_development", Some(400_000), None),
            ],
        ]);
        assert_eq!(ids(&merged), vec!["P1", "P2"]);
        assert_eq!(merged[0].source_id, "resale");
    }

    #[test]
    fn test_missing_price_sorts_as_zero() {
        let mut items = vec![
            listing("a", "s", Some(500), None),
            listing("b", "s", None, None),
            listing("c", "s", Some(100), None),
        ];
        sort_listings(&mut items, SortKey::PriceAsc);
        assert_eq!(ids(&items), vec!["b", "c", "a"]);
        sort_listings(&mut items, SortKey::PriceDesc);
        assert_eq!(ids(&items), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_recent_puts_undated_last_in_input_order() {
        let mut items = vec![
            listing("undated-1", "s", None, None),
            listing("old", "s", None, Some(1)),
            listing("undated-2", "s", None, None),
            listing("new", "s", None, Some(15)),
        ];
        sort_listings(&mut items, SortKey::RecentlyUpdated);
        assert_eq!(ids(&items), vec!["new", "old", "undated-1", "undated-2"]);
    }

    #[test]
    fn test_sorting_is_idempotent() {
        for key in [
            SortKey::PriceAsc,
            SortKey::PriceDesc,
            SortKey::SizeAsc,
            SortKey::SizeDesc,
            SortKey::RecentlyUpdated,
        ] {
            let mut items = vec![
                listing("a", "s", Some(300), Some(3)),
                listing("b", "s", Some(300), None),
                listing("c", "s", None, Some(3)),
                listing("d", "s", Some(100), None),
            ];
            sort_listings(&mut items, key);
            let once = items.clone();
            sort_listings(&mut items, key);
            assert_eq!(items, once, "{:?} not idempotent", key);
        }
    }
}

use async_trait::async_trait;
use std::cmp::Ordering;
use tracing::debug;

use super::descriptor::SourceDescriptor;
use super::traits::ListingSource;
use super::types::{OrderKind, Projection, RawRecord, SourceOrder, SourceQuery};
use crate::query::Predicate;
use crate::Result;

/// Listing collection held in memory
///
/// Evaluates compiled predicates directly against its rows. Used for demos and
/// tests; a database-backed source would render the predicate instead.
pub struct MemorySource {
    descriptor: SourceDescriptor,
    records: Vec<RawRecord>,
}

impl MemorySource {
    pub fn new(descriptor: SourceDescriptor, records: Vec<RawRecord>) -> Self {
        Self {
            descriptor,
            records,
        }
    }

    pub fn from_json(descriptor: SourceDescriptor, rows: Vec<serde_json::Value>) -> Self {
        Self::new(descriptor, rows.into_iter().map(RawRecord::new).collect())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Compare two rows the way every source is expected to order them.
///
/// Missing numbers count as zero; missing timestamps go last in both directions.
pub(crate) fn compare_records(a: &RawRecord, b: &RawRecord, order: &SourceOrder) -> Ordering {
    match order.kind {
        OrderKind::Numeric => {
            let x = a.number(&order.field).unwrap_or(0.0);
            let y = b.number(&order.field).unwrap_or(0.0);
            let ord = x.total_cmp(&y);
            if order.descending {
                ord.reverse()
            } else {
                ord
            }
        }
        OrderKind::Timestamp => match (a.timestamp(&order.field), b.timestamp(&order.field)) {
            (Some(x), Some(y)) if order.descending => y.cmp(&x),
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

#[async_trait]
impl ListingSource for MemorySource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>> {
        let mut matched: Vec<&RawRecord> = self
            .records
            .iter()
            .filter(|r| query.predicate.matches(r))
            .collect();

        if let Some(order) = &query.order {
            // Stable: rows that compare equal keep insertion order
            matched.sort_by(|a, b| compare_records(a, b, order));
        }

        let identity = [self.descriptor.identity_field.as_str()];
        let rows: Vec<RawRecord> = matched
            .into_iter()
            .skip(query.window.offset)
            .take(query.window.limit)
            .map(|r| match query.projection {
                Projection::Full => r.clone(),
                Projection::IdentityOnly => r.project(&identity),
            })
            .collect();

        debug!(
            "{}: {} rows for window {}+{}",
            self.descriptor.name,
            rows.len(),
            query.window.offset,
            query.window.limit
        );
        Ok(rows)
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64> {
        Ok(self.records.iter().filter(|r| predicate.matches(r)).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::catalog;
    use crate::sources::types::Window;
    use serde_json::json;

    fn source() -> MemorySource {
        MemorySource::from_json(
            catalog::resale(),
            vec![
                json!({"ref": "A", "price": 300_000, "updated": "2026-10-01T00:00:00Z"}),
                json!({"ref": "B", "price": 200_000}),
                json!({"ref": "C", "updated": "2026-10-10T00:00:00Z"}),
                json!({"ref": "D", "price": 900_000}),
            ],
        )
    }

    fn query(order: Option<SourceOrder>, window: Window) -> SourceQuery {
        SourceQuery {
            predicate: Predicate::All,
            order,
            window,
            projection: Projection::Full,
        }
    }

    fn refs(rows: &[RawRecord]) -> Vec<String> {
        rows.iter().filter_map(|r| r.text("ref")).collect()
    }

    #[tokio::test]
    async fn test_missing_price_sorts_as_zero() {
        let src = source();
        let order = src.descriptor().order_for(crate::models::SortKey::PriceAsc);
        let rows = src.fetch(&query(Some(order), Window::capped(10))).await.unwrap();
        assert_eq!(refs(&rows), vec!["C", "B", "A", "D"]);
    }

    #[tokio::test]
    async fn test_missing_timestamp_sorts_last_and_stable() {
        let src = source();
        let order = src
            .descriptor()
            .order_for(crate::models::SortKey::RecentlyUpdated);
        let rows = src.fetch(&query(Some(order), Window::capped(10))).await.unwrap();
        assert_eq!(refs(&rows), vec!["C", "A", "B", "D"]);
    }

    #[tokio::test]
    async fn test_window_and_projection() {
        let src = source();
        let mut q = query(None, Window::new(1, 2));
        q.projection = Projection::IdentityOnly;
        let rows = src.fetch(&q).await.unwrap();
        assert_eq!(refs(&rows), vec!["B", "C"]);
        assert!(rows[0].get("price").is_none());
        assert_eq!(src.count(&Predicate::All).await.unwrap(), 4);
    }
}

//! One paginator for both execution strategies
//!
//! Push-down: a single source that can order and window natively answers the
//! page itself, with a separate count query for the total.
//!
//! Full-scan: every routed source is read up to the row cap, results are merged
//! and sorted in memory, and the page is sliced from that one sequence. Merging
//! per-source top-k windows instead would need every source to agree on one
//! global order, which they cannot do cheaply; fetching everything buys a
//! correct cross-source order at the cost of a larger read per request.

use serde::Serialize;
use tracing::warn;

use super::executor::{self, RoutedSource};
use super::merge;
use super::normalize::Normalizer;
use crate::models::{Listing, SortKey};
use crate::sources::{Projection, RawRecord, SourceDescriptor, Window};
use crate::Result;

/// A page of the ordered, deduplicated result set
#[derive(Debug, Clone, Serialize)]
pub struct OrderedResultWindow {
    pub items: Vec<Listing>,
    pub offset: usize,
    pub limit: usize,
    pub total_count: u64,
    /// Some source hit the full-scan row cap; later rows were not seen
    pub truncated: bool,
}

impl OrderedResultWindow {
    pub fn empty(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
            limit,
            total_count: 0,
            truncated: false,
        }
    }

    pub fn has_more(&self) -> bool {
        (self.offset.saturating_add(self.limit) as u64) < self.total_count
    }
}

/// A page past the end reports its offset at the end of the set.
fn clamp_offset(offset: usize, total_count: u64) -> usize {
    usize::try_from(total_count).map_or(offset, |total| offset.min(total))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    PushDown,
    FullScan,
}

impl Strategy {
    pub fn for_sources(routed: &[RoutedSource]) -> Self {
        match routed {
            [only] if only.descriptor().supports_push_down => Self::PushDown,
            _ => Self::FullScan,
        }
    }
}

/// Full ordered result set
#[derive(Debug, Clone, Default)]
pub struct OrderedSet {
    pub listings: Vec<Listing>,
    pub truncated: bool,
}

pub struct Paginator<'a> {
    normalizer: &'a Normalizer,
    full_scan_cap: usize,
}

impl<'a> Paginator<'a> {
    pub fn new(normalizer: &'a Normalizer, full_scan_cap: usize) -> Self {
        Self {
            normalizer,
            full_scan_cap,
        }
    }

    /// Rows `[offset, offset + limit)` of the ordered set, plus the total.
    pub async fn window(
        &self,
        routed: &[RoutedSource],
        sort: SortKey,
        offset: usize,
        limit: usize,
    ) -> Result<OrderedResultWindow> {
        if routed.is_empty() || limit == 0 {
            return Ok(OrderedResultWindow::empty(limit));
        }

        match Strategy::for_sources(routed) {
            Strategy::PushDown => {
                let only = &routed[0];
                let (rows, total) =
                    executor::fetch_page(only, sort, Window::new(offset, limit)).await?;
                let mut items = self.normalize_rows(rows, only.descriptor());
                // Same ordering rules as full-scan, whatever the source did
                merge::sort_listings(&mut items, sort);
                items.truncate(limit);
                // A source whose count lags its rows still reports a consistent window
                let total_count = if items.is_empty() {
                    total
                } else {
                    total.max((offset + items.len()) as u64)
                };
                Ok(OrderedResultWindow {
                    items,
                    offset: clamp_offset(offset, total_count),
                    limit,
                    total_count,
                    truncated: false,
                })
            }
            Strategy::FullScan => {
                let set = self.ordered(routed, sort).await?;
                let total_count = set.listings.len() as u64;
                let items = set.listings.into_iter().skip(offset).take(limit).collect();
                Ok(OrderedResultWindow {
                    items,
                    offset: clamp_offset(offset, total_count),
                    limit,
                    total_count,
                    truncated: set.truncated,
                })
            }
        }
    }

    /// The whole ordered, deduplicated set.
    pub async fn ordered(&self, routed: &[RoutedSource], sort: SortKey) -> Result<OrderedSet> {
        if routed.is_empty() {
            return Ok(OrderedSet::default());
        }

        let per_source = match Strategy::for_sources(routed) {
            Strategy::PushDown => {
                let only = &routed[0];
                let order = only.descriptor().order_for(sort);
                vec![
                    executor::fetch(
                        only,
                        Some(order),
                        Window::capped(self.full_scan_cap),
                        Projection::Full,
                    )
                    .await?,
                ]
            }
            Strategy::FullScan => executor::fetch_all(routed, sort, self.full_scan_cap).await?,
        };

        let truncated = self.check_truncation(routed, &per_source);
        let normalized = routed
            .iter()
            .zip(per_source)
            .map(|(r, rows)| self.normalize_rows(rows, r.descriptor()))
            .collect();

        let mut listings = merge::merge(normalized);
        merge::sort_listings(&mut listings, sort);
        Ok(OrderedSet {
            listings,
            truncated,
        })
    }

    /// Identities of the whole ordered set, in order.
    ///
    /// A push-down source is asked for identities only; full-scan needs the sort
    /// fields, so it goes through the regular merge.
    pub async fn ordered_ids(&self, routed: &[RoutedSource], sort: SortKey) -> Result<Vec<String>> {
        match Strategy::for_sources(routed) {
            Strategy::PushDown => {
                let only = &routed[0];
                let order = only.descriptor().order_for(sort);
                let rows = executor::fetch(
                    only,
                    Some(order),
                    Window::capped(self.full_scan_cap),
                    Projection::IdentityOnly,
                )
                .await?;
                Ok(rows
                    .iter()
                    .filter_map(|r| Normalizer::identity(r, only.descriptor()))
                    .collect())
            }
            Strategy::FullScan => Ok(self
                .ordered(routed, sort)
                .await?
                .listings
                .into_iter()
                .map(|l| l.id)
                .collect()),
        }
    }

    fn normalize_rows(&self, rows: Vec<RawRecord>, source: &SourceDescriptor) -> Vec<Listing> {
        let before = rows.len();
        let listings: Vec<Listing> = rows
            .iter()
            .filter(|r| Normalizer::identity(r, source).is_some())
            .map(|r| self.normalizer.normalize(r, source))
            .collect();
        if listings.len() < before {
            warn!(
                "{}: dropped {} rows without `{}`",
                source.name,
                before - listings.len(),
                source.identity_field
            );
        }
        listings
    }

    fn check_truncation(&self, routed: &[RoutedSource], per_source: &[Vec<RawRecord>]) -> bool {
        let mut truncated = false;
        for (r, rows) in routed.iter().zip(per_source) {
            if rows.len() >= self.full_scan_cap {
                warn!(
                    "{}: full scan hit the {} row cap, results may be incomplete",
                    r.name(),
                    self.full_scan_cap
                );
                truncated = true;
            }
        }
        truncated
    }
}

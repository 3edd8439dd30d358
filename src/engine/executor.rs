//! Issues compiled queries against sources
//!
//! Fan-out is parallel and fail-fast: the first failing source fails the whole
//! operation and the remaining queries are dropped. Nothing here retries.

use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

use crate::models::SortKey;
use crate::query::Predicate;
use crate::sources::{
    ListingSource, Projection, RawRecord, SourceDescriptor, SourceOrder, SourceQuery, Window,
};
use crate::{Error, Result};

/// A source paired with the predicate compiled for it
#[derive(Clone)]
pub struct RoutedSource {
    pub source: Arc<dyn ListingSource>,
    pub predicate: Predicate,
}

impl RoutedSource {
    pub fn descriptor(&self) -> &SourceDescriptor {
        self.source.descriptor()
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }
}

impl std::fmt::Debug for RoutedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutedSource")
            .field("source", &self.name())
            .field("predicate", &self.predicate.to_string())
            .finish()
    }
}

/// Attribute any failure to the source it came from.
fn attribute(source_name: &str, err: Error) -> Error {
    match err {
        Error::SourceQuery { .. } => err,
        other => Error::source_query(source_name, other),
    }
}

pub async fn fetch(
    routed: &RoutedSource,
    order: Option<SourceOrder>,
    window: Window,
    projection: Projection,
) -> Result<Vec<RawRecord>> {
    let query = SourceQuery {
        predicate: routed.predicate.clone(),
        order,
        window,
        projection,
    };
    routed
        .source
        .fetch(&query)
        .await
        .map_err(|e| attribute(routed.name(), e))
}

pub async fn count(routed: &RoutedSource) -> Result<u64> {
    routed
        .source
        .count(&routed.predicate)
        .await
        .map_err(|e| attribute(routed.name(), e))
}

/// One page plus the total match count, queried concurrently.
pub async fn fetch_page(
    routed: &RoutedSource,
    sort: SortKey,
    window: Window,
) -> Result<(Vec<RawRecord>, u64)> {
    let order = routed.descriptor().order_for(sort);
    let (rows, total) = tokio::try_join!(
        fetch(routed, Some(order), window, Projection::Full),
        count(routed)
    )?;
    debug!(
        "{}: page {}+{} -> {} rows of {}",
        routed.name(),
        window.offset,
        window.limit,
        rows.len(),
        total
    );
    Ok((rows, total))
}

/// Every matching row (up to `cap`) from each source, in source order.
pub async fn fetch_all(
    routed: &[RoutedSource],
    sort: SortKey,
    cap: usize,
) -> Result<Vec<Vec<RawRecord>>> {
    try_join_all(routed.iter().map(|r| {
        let order = r.descriptor().order_for(sort);
        fetch(r, Some(order), Window::capped(cap), Projection::Full)
    }))
    .await
}

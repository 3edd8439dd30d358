//! Search run scheduling
//!
//! Every run is tagged with a fingerprint of what was asked for. Submitting a
//! new run aborts the one in flight, and results whose fingerprint no longer
//! matches the latest submission are dropped. Filter edits are coalesced by
//! [`debounce`] before they reach the runner.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::encoding;
use crate::engine::{OrderedResultWindow, PageRequest, SearchEngine};
use crate::models::{CanonicalFilter, Domain, SortKey};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(domain: Domain, filter: &CanonicalFilter, sort: SortKey, page: PageRequest) -> Self {
        let size = page
            .size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "default".to_string());
        Self(format!(
            "{}/{}/{}x{}?{}",
            domain.as_str(),
            sort.as_str(),
            page.number,
            size,
            encoding::to_query_string(filter)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub domain: Domain,
    pub filter: CanonicalFilter,
    pub sort: SortKey,
    pub page: PageRequest,
}

impl SearchRequest {
    pub fn new(domain: Domain, filter: CanonicalFilter) -> Self {
        Self {
            domain,
            filter,
            sort: SortKey::default(),
            page: PageRequest::first(),
        }
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self.domain, &self.filter, self.sort, self.page)
    }
}

/// Outcome of one finished run
#[derive(Debug)]
pub struct Completed {
    pub fingerprint: Fingerprint,
    pub outcome: Result<OrderedResultWindow>,
}

/// Runs searches with cancel-on-supersede semantics.
pub struct SearchRunner {
    engine: Arc<SearchEngine>,
    tx: mpsc::UnboundedSender<Completed>,
    rx: mpsc::UnboundedReceiver<Completed>,
    latest: Option<Fingerprint>,
    in_flight: Option<JoinHandle<()>>,
}

impl SearchRunner {
    pub fn new(engine: Arc<SearchEngine>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            engine,
            tx,
            rx,
            latest: None,
            in_flight: None,
        }
    }

    /// Start a run, aborting whatever was in flight.
    pub fn submit(&mut self, request: SearchRequest) -> Fingerprint {
        self.abort_in_flight();

        let fingerprint = request.fingerprint();
        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();
        let tag = fingerprint.clone();

        self.in_flight = Some(tokio::spawn(async move {
            let outcome = engine
                .search(request.domain, &request.filter, request.sort, request.page)
                .await;
            // Receiver gone means the runner was dropped
            let _ = tx.send(Completed {
                fingerprint: tag,
                outcome,
            });
        }));
        debug!("Submitted search {}", fingerprint);
        self.latest = Some(fingerprint.clone());
        fingerprint
    }

    /// Abort the in-flight run; a pending [`next_result`](Self::next_result) yields `Cancelled`.
    pub fn cancel(&mut self) {
        self.abort_in_flight();
        self.latest = None;
    }

    pub fn latest(&self) -> Option<&Fingerprint> {
        self.latest.as_ref()
    }

    /// Wait for the latest submission to finish, skipping superseded runs.
    pub async fn next_result(&mut self) -> Result<Completed> {
        let Some(latest) = self.latest.clone() else {
            return Err(Error::Cancelled);
        };

        while let Some(done) = self.rx.recv().await {
            if done.fingerprint == latest {
                self.latest = None;
                self.in_flight = None;
                return Ok(done);
            }
            debug!("Dropping superseded search {}", done.fingerprint);
        }
        Err(Error::Cancelled)
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if !handle.is_finished() {
                debug!("Aborting superseded search");
            }
            handle.abort();
        }
    }
}

impl Drop for SearchRunner {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A user edit; waits for the quiet period
    Edit,
    /// The whole filter was cleared; goes out at once and drops any pending edit
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterChange {
    pub filter: CanonicalFilter,
    pub origin: ChangeOrigin,
}

impl FilterChange {
    pub fn edit(filter: CanonicalFilter) -> Self {
        Self {
            filter,
            origin: ChangeOrigin::Edit,
        }
    }

    pub fn reset() -> Self {
        Self {
            filter: CanonicalFilter::default(),
            origin: ChangeOrigin::Reset,
        }
    }
}

/// Coalesce bursts of filter edits.
///
/// An edit is forwarded once no further change arrives for `quiet`. Resets
/// skip the wait. A pending edit is flushed when the input closes.
pub fn debounce(
    mut changes: mpsc::Receiver<FilterChange>,
    quiet: Duration,
) -> mpsc::Receiver<FilterChange> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut pending: Option<FilterChange> = None;
        loop {
            let next = if pending.is_some() {
                match tokio::time::timeout(quiet, changes.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        if let Some(change) = pending.take() {
                            if tx.send(change).await.is_err() {
                                return;
                            }
                        }
                        continue;
                    }
                }
            } else {
                changes.recv().await
            };

            match next {
                Some(change) if change.origin == ChangeOrigin::Reset => {
                    if pending.take().is_some() {
                        debug!("Reset discarded a pending filter edit");
                    }
                    if tx.send(change).await.is_err() {
                        return;
                    }
                }
                Some(change) => pending = Some(change),
                None => {
                    if let Some(change) = pending.take() {
                        let _ = tx.send(change).await;
                    }
                    return;
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::query::Predicate;
    use crate::sources::{
        catalog, ListingSource, MemorySource, RawRecord, SourceDescriptor, SourceQuery,
    };
    use async_trait::async_trait;
    use serde_json::json;

    struct SlowSource {
        inner: MemorySource,
        delay: Duration,
    }

    #[async_trait]
    impl ListingSource for SlowSource {
        fn descriptor(&self) -> &SourceDescriptor {
            self.inner.descriptor()
        }

        async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>> {
            tokio::time::sleep(self.delay).await;
            self.inner.fetch(query).await
        }

        async fn count(&self, predicate: &Predicate) -> Result<u64> {
            self.inner.count(predicate).await
        }
    }

    fn engine(delay: Duration) -> Arc<SearchEngine> {
        let rows = (0..30)
            .map(|i| json!({"ref": format!("R{i}"), "price": 200_000 + i * 1_000}))
            .collect();
        let source = SlowSource {
            inner: MemorySource::from_json(catalog::resale(), rows),
            delay,
        };
        Arc::new(
            SearchEngine::builder(SearchConfig::default())
                .source(Arc::new(source))
                .build(),
        )
    }

    fn request(page: usize) -> SearchRequest {
        SearchRequest::new(Domain::Sale, CanonicalFilter::new())
            .sorted_by(SortKey::PriceAsc)
            .page(PageRequest::new(page, 10))
    }

    #[test]
    fn test_fingerprint_tracks_every_input() {
        let base = request(1).fingerprint();
        assert_eq!(base, request(1).fingerprint());
        assert_ne!(base, request(2).fingerprint());
        assert_ne!(base, request(1).sorted_by(SortKey::PriceDesc).fingerprint());

        let mut located = request(1);
        located.filter = located.filter.with_location("Estepona");
        assert_ne!(base, located.fingerprint());

        let mut rental = request(1);
        rental.domain = Domain::Rental;
        assert_ne!(base, rental.fingerprint());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_run_is_aborted() {
        let mut runner = SearchRunner::new(engine(Duration::from_secs(1)));
        runner.submit(request(1));
        let second = runner.submit(request(2));

        let done = runner.next_result().await.unwrap();
        assert_eq!(done.fingerprint, second);
        let page = done.outcome.unwrap();
        assert_eq!(page.offset, 10);
        assert_eq!(page.items[0].id, "R10");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_completion_is_dropped() {
        let mut runner = SearchRunner::new(engine(Duration::from_millis(10)));
        runner.submit(request(1));
        // Let the first run finish and queue its result
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = runner.submit(request(3));
        let done = runner.next_result().await.unwrap();
        assert_eq!(done.fingerprint, second);
        assert_eq!(done.outcome.unwrap().items[0].id, "R20");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let mut runner = SearchRunner::new(engine(Duration::from_secs(1)));
        runner.submit(request(1));
        runner.cancel();
        assert!(runner.latest().is_none());
        assert!(matches!(runner.next_result().await, Err(Error::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_keeps_last_edit() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(rx, Duration::from_millis(300));

        for town in ["M", "Ma", "Mar"] {
            tx.send(FilterChange::edit(CanonicalFilter::new().with_location(town)))
                .await
                .unwrap();
        }

        let change = out.recv().await.unwrap();
        assert!(change.filter.locations.contains("Mar"));
        assert_eq!(change.filter.locations.len(), 1);

        drop(tx);
        assert!(out.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_flushes_and_discards_pending_edit() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(rx, Duration::from_millis(300));

        tx.send(FilterChange::edit(CanonicalFilter::new().with_location("Nerja")))
            .await
            .unwrap();
        tx.send(FilterChange::reset()).await.unwrap();

        let change = out.recv().await.unwrap();
        assert_eq!(change.origin, ChangeOrigin::Reset);
        assert!(change.filter.is_unconstrained());

        // The discarded edit never shows up
        let nothing = tokio::time::timeout(Duration::from_secs(5), out.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_edit_flushed_on_close() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(rx, Duration::from_secs(60));
        tx.send(FilterChange::edit(CanonicalFilter::new().with_location("Mijas")))
            .await
            .unwrap();
        drop(tx);
        let change = out.recv().await.unwrap();
        assert!(change.filter.locations.contains("Mijas"));
    }
}

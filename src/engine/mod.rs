//! Federated listing search
//!
//! Compiles one canonical filter per source, queries the routed sources,
//! normalizes and merges their rows into one ordered set, and pages over it.
//! Every completed search replaces the domain's search context, which the
//! navigator later uses to rebuild the same order.

pub mod executor;
pub mod gazetteer;
pub mod merge;
pub mod navigate;
pub mod normalize;
pub mod paginate;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::context::{ContextStore, MemoryContextStore, SearchContext};
use crate::models::{CanonicalFilter, Domain, Listing, SortKey};
use crate::query::{compile, CompilePolicy, Compiled};
use crate::sources::ListingSource;
use crate::{Error, Result};

pub use executor::RoutedSource;
pub use gazetteer::Gazetteer;
pub use navigate::Neighbors;
pub use normalize::Normalizer;
pub use paginate::{OrderedResultWindow, Paginator, Strategy};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// 1-based page number and optional page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub number: usize,
    pub size: Option<usize>,
}

impl PageRequest {
    pub fn new(number: usize, size: usize) -> Self {
        Self {
            number,
            size: Some(size),
        }
    }

    pub fn first() -> Self {
        Self {
            number: 1,
            size: None,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

pub struct SearchEngine {
    domains: HashMap<Domain, Vec<Arc<dyn ListingSource>>>,
    config: SearchConfig,
    normalizer: Normalizer,
    contexts: Arc<dyn ContextStore>,
    clock: Clock,
}

pub struct SearchEngineBuilder {
    domains: HashMap<Domain, Vec<Arc<dyn ListingSource>>>,
    config: SearchConfig,
    contexts: Option<Arc<dyn ContextStore>>,
    clock: Option<Clock>,
}

impl SearchEngineBuilder {
    /// Register a source; within a domain, earlier sources win identity ties.
    pub fn source(mut self, source: Arc<dyn ListingSource>) -> Self {
        let domain = source.descriptor().domain;
        self.domains.entry(domain).or_default().push(source);
        self
    }

    pub fn context_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.contexts = Some(store);
        self
    }

    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn build(self) -> SearchEngine {
        SearchEngine {
            normalizer: Normalizer::from_config(&self.config),
            domains: self.domains,
            config: self.config,
            contexts: self
                .contexts
                .unwrap_or_else(|| Arc::new(MemoryContextStore::new()) as Arc<dyn ContextStore>),
            clock: self.clock.unwrap_or_else(|| Arc::new(Utc::now) as Clock),
        }
    }
}

impl SearchEngine {
    pub fn builder(config: SearchConfig) -> SearchEngineBuilder {
        SearchEngineBuilder {
            domains: HashMap::new(),
            config,
            contexts: None,
            clock: None,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn context_store(&self) -> &Arc<dyn ContextStore> {
        &self.contexts
    }

    pub(crate) fn paginator(&self) -> Paginator<'_> {
        Paginator::new(&self.normalizer, self.config.full_scan_cap)
    }

    /// Compile the filter for each of the domain's sources, dropping the ones it routes away from.
    pub fn route(&self, domain: Domain, filter: &CanonicalFilter) -> Result<Vec<RoutedSource>> {
        let sources = self
            .domains
            .get(&domain)
            .filter(|s| !s.is_empty())
            .ok_or(Error::UnknownDomain(domain))?;
        let policy = CompilePolicy::from_config(&self.config, (self.clock)());

        Ok(sources
            .iter()
            .filter_map(|source| match compile(filter, source.descriptor(), &policy) {
                Compiled::Query(predicate) => Some(RoutedSource {
                    source: Arc::clone(source),
                    predicate,
                }),
                Compiled::Skip => None,
            })
            .collect())
    }

    /// One page of the ordered result set.
    pub async fn search(
        &self,
        domain: Domain,
        filter: &CanonicalFilter,
        sort: SortKey,
        page: PageRequest,
    ) -> Result<OrderedResultWindow> {
        let limit = self.config.page_size(page.size);
        let offset = page
            .number
            .max(1)
            .saturating_sub(1)
            .checked_mul(limit)
            .ok_or_else(|| {
                Error::invalid_parameter("page", format!("page {} is out of range", page.number))
            })?;

        let routed = self.route(domain, filter)?;
        let window = self.paginator().window(&routed, sort, offset, limit).await?;

        self.remember(domain, filter, sort, window.total_count).await;
        info!(
            "{} search: {} of {} listings from {} source(s), offset {}",
            domain,
            window.items.len(),
            window.total_count,
            routed.len(),
            offset
        );
        Ok(window)
    }

    /// The complete ordered result set, for map display.
    pub async fn search_all(
        &self,
        domain: Domain,
        filter: &CanonicalFilter,
        sort: SortKey,
    ) -> Result<Vec<Listing>> {
        let routed = self.route(domain, filter)?;
        let set = self.paginator().ordered(&routed, sort).await?;

        self.remember(domain, filter, sort, set.listings.len() as u64)
            .await;
        info!(
            "{} full search: {} listings{}",
            domain,
            set.listings.len(),
            if set.truncated { " (truncated)" } else { "" }
        );
        Ok(set.listings)
    }

    /// Replace the domain's search context; a store failure only costs prev/next navigation.
    async fn remember(&self, domain: Domain, filter: &CanonicalFilter, sort: SortKey, total_count: u64) {
        let context = SearchContext {
            filter: filter.clone(),
            sort,
            domain,
            total_count,
        };
        if let Err(e) = self.contexts.save(context).await {
            warn!("Failed to save {} search context: {}", domain, e);
        }
    }
}

use async_trait::async_trait;

use super::descriptor::SourceDescriptor;
use super::types::{RawRecord, SourceQuery};
use crate::query::Predicate;
use crate::Result;

/// Common trait for every queryable listing collection
///
/// Sources are read-only: filtered, ordered, range-limited reads plus a count.
/// Adding a collection means implementing this and supplying a descriptor.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Static metadata: field names, dialect, capabilities
    fn descriptor(&self) -> &SourceDescriptor;

    /// Rows matching the query, in the requested order and window
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>>;

    /// Number of rows matching the predicate
    async fn count(&self, predicate: &Predicate) -> Result<u64>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }
}

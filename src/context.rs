//! Last completed search per domain
//!
//! Contexts are always replaced whole, never patched field by field, and read
//! only when a detail view opens. Last writer wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{CanonicalFilter, Domain, SortKey};
use crate::{Error, Result};

/// Everything needed to rebuild the ordered set a user saw
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchContext {
    pub filter: CanonicalFilter,
    pub sort: SortKey,
    pub domain: Domain,
    pub total_count: u64,
}

#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Replace the context for `context.domain`.
    async fn save(&self, context: SearchContext) -> Result<()>;

    async fn load(&self, domain: Domain) -> Result<Option<SearchContext>>;
}

#[derive(Debug, Default)]
pub struct MemoryContextStore {
    contexts: RwLock<HashMap<Domain, SearchContext>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn save(&self, context: SearchContext) -> Result<()> {
        self.contexts.write().await.insert(context.domain, context);
        Ok(())
    }

    async fn load(&self, domain: Domain) -> Result<Option<SearchContext>> {
        Ok(self.contexts.read().await.get(&domain).cloned())
    }
}

/// One `<domain>.json` file per domain
///
/// Writes go to a temporary file first and are renamed into place, so a reader
/// never sees half a context.
#[derive(Debug, Clone)]
pub struct JsonFileContextStore {
    dir: PathBuf,
}

impl JsonFileContextStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, domain: Domain) -> PathBuf {
        self.dir.join(format!("{}.json", domain.as_str()))
    }
}

#[async_trait]
impl ContextStore for JsonFileContextStore {
    async fn save(&self, context: SearchContext) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(context.domain);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&context)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Saved {} search context to {}", context.domain, path.display());
        Ok(())
    }

    async fn load(&self, domain: Domain) -> Result<Option<SearchContext>> {
        let path = self.path_for(domain);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::ContextStore(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn context(domain: Domain, total: u64) -> SearchContext {
        SearchContext {
            filter: CanonicalFilter::new()
                .with_location("Marbella")
                .with_category(Category::Apartment),
            sort: SortKey::PriceAsc,
            domain,
            total_count: total,
        }
    }

    #[tokio::test]
    async fn test_memory_store_replaces_per_domain() {
        let store = MemoryContextStore::new();
        store.save(context(Domain::Sale, 10)).await.unwrap();
        store.save(context(Domain::Rental, 3)).await.unwrap();
        store.save(context(Domain::Sale, 42)).await.unwrap();

        assert_eq!(store.load(Domain::Sale).await.unwrap().unwrap().total_count, 42);
        assert_eq!(store.load(Domain::Rental).await.unwrap().unwrap().total_count, 3);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileContextStore::new(dir.path().join("contexts"));

        assert!(store.load(Domain::Sale).await.unwrap().is_none());

        let saved = context(Domain::Sale, 7);
        store.save(saved.clone()).await.unwrap();
        assert_eq!(store.load(Domain::Sale).await.unwrap(), Some(saved));
        assert!(store.load(Domain::Rental).await.unwrap().is_none());
        assert!(!dir.path().join("contexts/sale.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rental.json"), "{not json").unwrap();
        let store = JsonFileContextStore::new(dir.path());
        assert!(matches!(
            store.load(Domain::Rental).await,
            Err(Error::ContextStore(_))
        ));
    }
}

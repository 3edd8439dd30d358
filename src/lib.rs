//! Federated property listing search
//!
//! One canonical filter is compiled into a predicate per source, the sources
//! are queried in parallel, and their rows are normalized, deduplicated and
//! ordered into a single paged result set. The last search per domain is kept
//! so a detail view can step to the previous and next listing.

pub mod config;
pub mod context;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod sample;
pub mod scheduler;
pub mod sources;

pub use config::SearchConfig;
pub use context::{ContextStore, JsonFileContextStore, MemoryContextStore, SearchContext};
pub use engine::{Neighbors, OrderedResultWindow, PageRequest, SearchEngine, SearchEngineBuilder};
pub use error::{Error, Result};
pub use models::{Amenity, CanonicalFilter, Category, Domain, Listing, SortKey};
pub use scheduler::{ChangeOrigin, FilterChange, Fingerprint, SearchRequest, SearchRunner};

//! Search engine configuration
//!
//! Loaded from a TOML file; every key is optional and falls back to its default.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Upper bound for `rental_recency_days`, one century
pub const MAX_RENTAL_RECENCY_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum listing price enforced on every sale search
    pub sale_price_floor: i64,
    /// Rentals with a long-term price below this are never returned
    pub rental_price_floor: i64,
    /// Rentals not updated within this many days are never returned
    pub rental_recency_days: i64,
    /// Row cap per source in full-scan mode
    pub full_scan_cap: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Quiescence window before a filter edit triggers a search
    pub debounce_ms: u64,
    /// Words of description used when a listing has no better title
    pub title_word_count: usize,
    /// Appended to a town name for the last geocoding attempt
    pub geocode_suffix: String,
    /// Place name -> `[latitude, longitude]`
    pub gazetteer: BTreeMap<String, [f64; 2]>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sale_price_floor: 150_000,
            rental_price_floor: 1_000,
            rental_recency_days: 45,
            full_scan_cap: 50_000,
            default_page_size: 20,
            max_page_size: 100,
            debounce_ms: 300,
            title_word_count: 8,
            geocode_suffix: "town".to_string(),
            gazetteer: BTreeMap::new(),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a TOML file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.full_scan_cap == 0 {
            return Err(Error::Config("full_scan_cap must be positive".to_string()));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(Error::Config(format!(
                "default_page_size must be between 1 and max_page_size ({})",
                self.max_page_size
            )));
        }
        if !(0..=MAX_RENTAL_RECENCY_DAYS).contains(&self.rental_recency_days) {
            return Err(Error::Config(format!(
                "rental_recency_days must be between 0 and {}",
                MAX_RENTAL_RECENCY_DAYS
            )));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Clamp a requested page size into `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

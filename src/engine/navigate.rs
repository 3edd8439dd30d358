//! Previous/next resolution for the detail view
//!
//! Position is recomputed from the saved search context on every call: the
//! full ordered identity list is queried again and scanned for the listing.
//! That costs one extra query per detail view but always agrees with the list
//! the user actually browsed.

use serde::Serialize;
use tracing::{debug, warn};

use super::SearchEngine;
use crate::context::SearchContext;
use crate::models::Domain;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Neighbors {
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl SearchEngine {
    /// Index of `id` in the context's ordered set, if it is still there.
    pub async fn locate(&self, id: &str, context: &SearchContext) -> Result<Option<usize>> {
        let routed = self.route(context.domain, &context.filter)?;
        let ids = self.paginator().ordered_ids(&routed, context.sort).await?;
        Ok(ids.iter().position(|candidate| candidate == id))
    }

    /// Identity at `index` of the context's ordered set; `None` past the end.
    pub async fn neighbor(&self, index: usize, context: &SearchContext) -> Result<Option<String>> {
        let routed = self.route(context.domain, &context.filter)?;
        let window = self
            .paginator()
            .window(&routed, context.sort, index, 1)
            .await?;
        Ok(window.items.into_iter().next().map(|listing| listing.id))
    }

    /// Neighbors of a listing within the last search run in `domain`.
    ///
    /// No context, an unreadable context, a context for a domain without
    /// sources, or a listing that no longer matches all resolve to no
    /// neighbors rather than an error.
    pub async fn navigate(&self, id: &str, domain: Domain) -> Result<Neighbors> {
        let context = match self.contexts.load(domain).await {
            Ok(Some(context)) => context,
            Ok(None) => {
                debug!("No {} search context, navigation disabled", domain);
                return Ok(Neighbors::default());
            }
            Err(e) => {
                warn!("Could not read {} search context: {}", domain, e);
                return Ok(Neighbors::default());
            }
        };

        let index = match self.locate(id, &context).await {
            Ok(Some(index)) => index,
            Ok(None) => {
                debug!("{} is no longer in the {} result set", id, domain);
                return Ok(Neighbors::default());
            }
            Err(Error::UnknownDomain(stale)) => {
                debug!("Saved context points at {}, which has no sources", stale);
                return Ok(Neighbors::default());
            }
            Err(e) => return Err(e),
        };

        let previous = async {
            match index.checked_sub(1) {
                Some(prev) => self.neighbor(prev, &context).await,
                None => Ok(None),
            }
        };
        let next = self.neighbor(index + 1, &context);
        let (previous, next) = tokio::try_join!(previous, next)?;

        Ok(Neighbors { previous, next })
    }
}

//! Error types for the listing search engine

use thiserror::Error;

use crate::models::Domain;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A source's fetch or count call failed; never masked or partially merged.
    #[error("query against source `{source_name}` failed: {reason}")]
    SourceQuery { source_name: String, reason: String },

    /// The run was superseded by a newer search.
    #[error("search cancelled")]
    Cancelled,

    #[error("invalid search parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("no sources configured for domain: {0}")]
    UnknownDomain(Domain),

    #[error("search context store error: {0}")]
    ContextStore(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn source_query(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceQuery {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure should reach the user as "search could not complete, please retry".
    ///
    /// Cancelled runs are dropped silently and never count.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::SourceQuery { .. } | Self::Io(_) | Self::Other(_))
    }
}

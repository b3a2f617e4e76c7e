//! Error types for HALCYON operations

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;

/// Navigational relations of a paged collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageLink {
    Next,
    Prev,
    First,
    Last,
    /// The collection's own address, needed by `page`/`size`/`sort`.
    Current,
}

impl PageLink {
    /// HAL relation name for this link.
    pub fn rel(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
            Self::First => "first",
            Self::Last => "last",
            Self::Current => "self",
        }
    }
}

impl fmt::Display for PageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rel())
    }
}

/// Master error type for all HALCYON errors.
#[derive(Debug, Error)]
pub enum HalError {
    /// The named relation is missing from a resource's link map.
    #[error("no relation found: {relation}")]
    RelationNotFound { relation: String },

    /// The requested page-navigation URI is not present on the collection.
    #[error("no {link} defined")]
    NavigationNotAvailable { link: PageLink },

    /// The server answered with a 5xx; `message` is the body's `error` field.
    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Any other non-success status.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16, body: Value },

    /// Failure raised by the transport collaborator, passed through unchanged.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A resource was required to be addressable but has no `self` link.
    #[error("resource has no self link")]
    MissingSelfLink,

    /// A payload could not be mapped onto the target type.
    #[error("hydration failed: {0}")]
    Hydration(#[from] serde_json::Error),

    #[error("invalid URI template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// A URL that had to be absolute did not parse.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: ::url::ParseError,
    },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl HalError {
    /// Wrap an arbitrary transport error.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }

    pub fn relation_not_found(relation: impl Into<String>) -> Self {
        Self::RelationNotFound {
            relation: relation.into(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, source: ::url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Build the error for a non-success status, surfacing a 5xx body's
    /// `error` field verbatim.
    pub fn from_status(status: u16, body: Value) -> Self {
        if status >= 500 {
            let message = match body.get("error") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            Self::ServerError { status, message }
        } else {
            Self::UnexpectedStatus { status, body }
        }
    }

    /// True for failures that originate below the hydration layer.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ServerError { .. } | Self::UnexpectedStatus { .. }
        )
    }
}

/// Result type alias for HALCYON operations.
pub type HalResult<T> = Result<T, HalError>;

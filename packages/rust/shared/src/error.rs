//! Error types for postpress.
//!
//! Library crates use [`PublishError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Sub-steps whose failure should only degrade a post (tags, the category,
//! featured media) return [`Recoverable`] instead, so each call site in the
//! orchestrator decides explicitly what a failure costs.

use std::path::PathBuf;

/// Top-level error type for all postpress operations.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Missing or invalid configuration (environment, config file).
    #[error("config error: {message}")]
    Config { message: String },

    /// The initial API probe failed; nothing was published.
    #[error("connectivity check failed: {message}")]
    Connectivity { message: String },

    /// The remote API answered with a non-2xx status.
    #[error("{method} {endpoint} returned HTTP {status}: {snippet}")]
    Transport {
        status: u16,
        method: String,
        endpoint: String,
        snippet: String,
        /// The full error body, when the API answered with JSON.
        details: Option<serde_json::Value>,
    },

    /// Connection-level failure (DNS, refused, TLS, reset).
    #[error("{method} {endpoint}: network error: {message}")]
    Network {
        method: String,
        endpoint: String,
        message: String,
    },

    /// The request did not complete within its time bound.
    #[error("{method} {endpoint}: timed out after {secs}s")]
    Timeout {
        method: String,
        endpoint: String,
        secs: u64,
    },

    /// An image download kept redirecting.
    #[error("too many redirects (more than {limit}) fetching {url}")]
    TooManyRedirects { url: String, limit: usize },

    /// An image download ended on a non-200 response.
    #[error("image fetch failed for {url}: HTTP {status}")]
    ImageFetch { url: String, status: u16 },

    /// JSON decoding of the index or an API response failed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (duplicate slug, unparseable date, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PublishError>;

impl PublishError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a connectivity error from any displayable message.
    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status code, if the error came from a remote response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } | Self::ImageFetch { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the error is a missing local file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Recoverable sub-step failures
// ---------------------------------------------------------------------------

/// The sub-step of a post's publish that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubStep {
    /// Resolving a tag by name.
    Tag(String),
    /// Resolving the run-wide category by name.
    Category(String),
    /// Finding, downloading or uploading the featured image.
    FeaturedMedia,
}

impl std::fmt::Display for SubStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tag(name) => write!(f, "tag '{name}'"),
            Self::Category(name) => write!(f, "category '{name}'"),
            Self::FeaturedMedia => write!(f, "featured media"),
        }
    }
}

/// A sub-step failure that degrades a post's payload rather than failing it.
#[derive(Debug, thiserror::Error)]
#[error("{step}: {source}")]
pub struct Recoverable {
    pub step: SubStep,
    #[source]
    pub source: PublishError,
}

impl Recoverable {
    pub fn new(step: SubStep, source: PublishError) -> Self {
        Self { step, source }
    }
}

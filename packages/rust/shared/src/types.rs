//! Core domain types: the local post index and the remote WordPress resources.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PublishError, Result};

// ---------------------------------------------------------------------------
// Local post index
// ---------------------------------------------------------------------------

/// One post as listed in the committed JSON index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIndexEntry {
    /// Unique key, shared with the markdown filename and the remote slug.
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    /// Publication date as written in the index (`YYYY-MM-DD` or RFC 3339).
    pub date: String,
    #[serde(default)]
    pub author: String,
    /// Tag names, in index order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Source URL of the featured image, if any.
    #[serde(
        default,
        alias = "featuredImageUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub featured_image: Option<String>,
}

/// The `index.json` document: `{ "posts": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostIndex {
    pub posts: Vec<PostIndexEntry>,
}

impl PostIndex {
    /// Parse an index from JSON text and validate slug uniqueness.
    pub fn from_json(json: &str) -> Result<Self> {
        let index: Self = serde_json::from_str(json)
            .map_err(|e| PublishError::parse(format!("invalid post index: {e}")))?;
        index.validate()?;
        Ok(index)
    }

    /// Read and parse an index file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PublishError::io(path, e))?;
        Self::from_json(&content).map_err(|e| match e {
            PublishError::Parse { message } => {
                PublishError::parse(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Slugs must be non-empty and unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.posts {
            if entry.slug.trim().is_empty() {
                return Err(PublishError::validation(format!(
                    "post '{}' has an empty slug",
                    entry.title
                )));
            }
            if !seen.insert(entry.slug.as_str()) {
                return Err(PublishError::validation(format!(
                    "duplicate slug '{}' in post index",
                    entry.slug
                )));
            }
        }
        Ok(())
    }

    /// Keep only the entries whose slug is in `only` (no-op when empty).
    pub fn filtered(&self, only: &[String]) -> Self {
        if only.is_empty() {
            return self.clone();
        }
        Self {
            posts: self
                .posts
                .iter()
                .filter(|p| only.iter().any(|s| s == &p.slug))
                .cloned()
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Remote resources
// ---------------------------------------------------------------------------

/// A post as returned by the posts resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePost {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub status: String,
}

/// The body sent on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPayload {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub status: String,
    /// ISO-8601 local date-time, e.g. `2024-03-15T00:00:00`.
    pub date: String,
    pub tags: Vec<u64>,
    pub categories: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<u64>,
}

/// A tag or category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    pub id: u64,
    pub name: String,
}

/// An item in the media library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
}

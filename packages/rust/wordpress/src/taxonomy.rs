//! Tag and category resolution: human-readable names to remote term ids.
//!
//! Names are matched case-insensitively against the site's existing terms
//! before a new term is created, so re-running never duplicates a term.

use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use postpress_shared::{PublishError, Recoverable, Result, SubStep, TaxonomyTerm};

use crate::client::{WpClient, endpoint_with_query};

/// Page size used when searching terms.
const SEARCH_PAGE_SIZE: &str = "100";

/// Which taxonomy a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyKind {
    Tag,
    Category,
}

impl TaxonomyKind {
    /// REST collection for this taxonomy.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Category => "categories",
        }
    }

    fn step(&self, name: &str) -> SubStep {
        match self {
            Self::Tag => SubStep::Tag(name.to_string()),
            Self::Category => SubStep::Category(name.to_string()),
        }
    }
}

/// Resolve a term name to its id, creating the term on first use.
///
/// The first case-insensitive exact match from the search wins.
#[instrument(skip(client))]
pub async fn resolve_term(
    client: &WpClient,
    kind: TaxonomyKind,
    name: &str,
) -> std::result::Result<u64, Recoverable> {
    search_or_create(client, kind, name)
        .await
        .map_err(|e| Recoverable::new(kind.step(name), e))
}

/// Look up a term without creating it.
#[instrument(skip(client))]
pub async fn lookup_term(
    client: &WpClient,
    kind: TaxonomyKind,
    name: &str,
) -> std::result::Result<Option<u64>, Recoverable> {
    search_term(client, kind, name)
        .await
        .map_err(|e| Recoverable::new(kind.step(name), e))
}

async fn search_or_create(client: &WpClient, kind: TaxonomyKind, name: &str) -> Result<u64> {
    if let Some(id) = search_term(client, kind, name).await? {
        debug!(id, "existing term found");
        return Ok(id);
    }
    create_term(client, kind, name).await
}

async fn search_term(client: &WpClient, kind: TaxonomyKind, name: &str) -> Result<Option<u64>> {
    let endpoint = endpoint_with_query(
        kind.endpoint(),
        &[("search", name), ("per_page", SEARCH_PAGE_SIZE)],
    );
    let terms: Vec<TaxonomyTerm> = client.get_json(&endpoint).await?;
    Ok(pick_match(&terms, name))
}

async fn create_term(client: &WpClient, kind: TaxonomyKind, name: &str) -> Result<u64> {
    let body = serde_json::json!({ "name": name });
    match client
        .send_json::<TaxonomyTerm>(Method::POST, kind.endpoint(), &body)
        .await
    {
        Ok(term) => {
            info!(id = term.id, kind = kind.endpoint(), name, "created term");
            Ok(term.id)
        }
        // A concurrent create or a search that missed an entity-encoded name.
        Err(err) => match existing_term_id(&err) {
            Some(id) => {
                debug!(id, "term already exists");
                Ok(id)
            }
            None => Err(err),
        },
    }
}

/// First term whose (entity-decoded) name equals `name`, ignoring case.
fn pick_match(terms: &[TaxonomyTerm], name: &str) -> Option<u64> {
    let wanted = name.trim().to_lowercase();
    terms
        .iter()
        .find(|t| decode_entities(&t.name).trim().to_lowercase() == wanted)
        .map(|t| t.id)
}

/// WordPress returns term names HTML-escaped.
fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

#[derive(Deserialize)]
struct TermExists {
    code: String,
    data: TermExistsData,
}

#[derive(Deserialize)]
struct TermExistsData {
    term_id: u64,
}

/// The id carried by a `term_exists` error response.
fn existing_term_id(err: &PublishError) -> Option<u64> {
    match err {
        PublishError::Transport {
            status: 400,
            details: Some(details),
            ..
        } => TermExists::deserialize(details)
            .ok()
            .filter(|e| e.code == "term_exists")
            .map(|e| e.data.term_id),
        _ => None,
    }
}

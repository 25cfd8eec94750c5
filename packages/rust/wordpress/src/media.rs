//! Featured-image attachment.
//!
//! A post's featured image is uploaded once under the deterministic name
//! `<slug>-featured.<ext>`; later runs find it in the media library by slug
//! and reuse it instead of uploading again.

use tracing::{debug, info, instrument};

use postpress_shared::{MediaAsset, Recoverable, Result, SubStep};

use crate::client::{WpClient, endpoint_with_query};

/// Page size used when searching the media library.
const SEARCH_PAGE_SIZE: &str = "20";

/// Fallback extension when neither content type nor URL tell us one.
const DEFAULT_EXTENSION: &str = "jpg";

/// Make sure the post's featured image exists remotely and return its id.
///
/// Returns `Ok(None)` when the post has no featured image.
#[instrument(skip(client))]
pub async fn ensure_featured_media(
    client: &WpClient,
    slug: &str,
    source_url: Option<&str>,
) -> std::result::Result<Option<u64>, Recoverable> {
    let Some(source_url) = source_url else {
        return Ok(None);
    };

    find_or_upload(client, slug, source_url)
        .await
        .map(Some)
        .map_err(|e| Recoverable::new(SubStep::FeaturedMedia, e))
}

/// Look up a previously uploaded featured image without uploading.
#[instrument(skip(client))]
pub async fn find_existing_media(
    client: &WpClient,
    slug: &str,
) -> std::result::Result<Option<u64>, Recoverable> {
    find_existing(client, slug)
        .await
        .map_err(|e| Recoverable::new(SubStep::FeaturedMedia, e))
}

async fn find_or_upload(client: &WpClient, slug: &str, source_url: &str) -> Result<u64> {
    if let Some(id) = find_existing(client, slug).await? {
        debug!(id, "reusing existing featured media");
        return Ok(id);
    }
    upload_featured(client, slug, source_url).await
}

async fn find_existing(client: &WpClient, slug: &str) -> Result<Option<u64>> {
    let fragment = format!("{slug}-featured");
    let endpoint = endpoint_with_query(
        "media",
        &[("search", fragment.as_str()), ("per_page", SEARCH_PAGE_SIZE)],
    );
    let assets: Vec<MediaAsset> = client.get_json(&endpoint).await?;
    Ok(assets
        .iter()
        .find(|asset| asset.slug.contains(slug))
        .map(|asset| asset.id))
}

async fn upload_featured(client: &WpClient, slug: &str, source_url: &str) -> Result<u64> {
    let image = client.download(source_url).await?;
    let filename = featured_filename(slug, &image.content_type, image.final_url.path());

    let asset: MediaAsset = client
        .upload("media", image.bytes, &image.content_type, &filename)
        .await?
        .decode("media")?;

    info!(id = asset.id, %filename, "uploaded featured media");
    Ok(asset.id)
}

/// `<slug>-featured.<ext>`, with the extension implied by the content type.
pub fn featured_filename(slug: &str, content_type: &str, url_path: &str) -> String {
    format!("{slug}-featured.{}", extension_for(content_type, url_path))
}

fn extension_for(content_type: &str, url_path: &str) -> String {
    let from_type = match content_type {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/avif" => Some("avif"),
        _ => None,
    };
    if let Some(ext) = from_type {
        return ext.to_string();
    }

    url_path
        .rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

//! Assembly of the remote post payload from an index entry.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use postpress_shared::{PostIndexEntry, PostPayload, PublishError, Result};

/// Status every published post is sent with.
pub const PUBLISH_STATUS: &str = "publish";

/// Format WordPress expects for the `date` field (site-local, no offset).
const WP_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Naive date-time layouts accepted as-is.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Convert an index date to the ISO-8601 form WordPress stores.
///
/// `2024-03-15` becomes `2024-03-15T00:00:00`; RFC 3339 input keeps its
/// wall-clock time and drops the offset.
pub fn to_wp_date(raw: &str) -> Result<String> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date
            .and_time(NaiveTime::default())
            .format(WP_DATE_FORMAT)
            .to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local().format(WP_DATE_FORMAT).to_string());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.format(WP_DATE_FORMAT).to_string())
        .ok_or_else(|| PublishError::validation(format!("unrecognized date '{raw}'")))
}

/// Resolved remote ids for one post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRefs {
    pub tags: Vec<u64>,
    pub categories: Vec<u64>,
    pub featured_media: Option<u64>,
}

/// Build the create/update body for an entry.
pub fn build_payload(
    entry: &PostIndexEntry,
    html: String,
    date: String,
    refs: ResolvedRefs,
) -> PostPayload {
    PostPayload {
        title: entry.title.clone(),
        slug: entry.slug.clone(),
        content: html,
        excerpt: entry.excerpt.clone(),
        status: PUBLISH_STATUS.to_string(),
        date,
        tags: refs.tags,
        categories: refs.categories,
        featured_media: refs.featured_media,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_date_becomes_midnight() {
        assert_eq!(to_wp_date("2024-03-15").unwrap(), "2024-03-15T00:00:00");
        assert_eq!(to_wp_date(" 2024-03-15 ").unwrap(), "2024-03-15T00:00:00");
    }

    #[test]
    fn rfc3339_keeps_wall_clock() {
        assert_eq!(
            to_wp_date("2024-03-15T09:30:00+02:00").unwrap(),
            "2024-03-15T09:30:00"
        );
        assert_eq!(
            to_wp_date("2024-03-15T09:30:00Z").unwrap(),
            "2024-03-15T09:30:00"
        );
    }

    #[test]
    fn naive_datetimes_accepted() {
        assert_eq!(
            to_wp_date("2024-03-15T09:30").unwrap(),
            "2024-03-15T09:30:00"
        );
        assert_eq!(
            to_wp_date("2024-03-15 09:30:15").unwrap(),
            "2024-03-15T09:30:15"
        );
    }

    #[test]
    fn garbage_date_is_validation_error() {
        let err = to_wp_date("March 15th").unwrap_err();
        assert!(matches!(err, PublishError::Validation { .. }));
        assert!(to_wp_date("2024-13-45").is_err());
    }

    #[test]
    fn payload_maps_entry_fields() {
        let entry = PostIndexEntry {
            slug: "hello".into(),
            title: "Hello".into(),
            excerpt: "Short".into(),
            date: "2024-01-02".into(),
            author: "Sam".into(),
            tags: vec!["Rust".into()],
            featured_image: None,
        };
        let payload = build_payload(
            &entry,
            "<p>Hi</p>".into(),
            "2024-01-02T00:00:00".into(),
            ResolvedRefs {
                tags: vec![4],
                categories: vec![1],
                featured_media: Some(9),
            },
        );
        assert_eq!(payload.status, "publish");
        assert_eq!(payload.slug, "hello");
        assert_eq!(payload.excerpt, "Short");
        assert_eq!(payload.tags, vec![4]);
        assert_eq!(payload.featured_media, Some(9));
    }
}

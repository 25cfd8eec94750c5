//! The publish run: index → markdown → taxonomy → media → upsert, per post.
//!
//! Posts are processed strictly one after another. Each post moves through
//! `Loaded → Rendered → TaxonomyResolved → MediaResolved → Upserted`, or ends
//! early as `Skipped` (no markdown file) or `Failed`. A failed post is
//! recorded and the run moves on; tag, category and media failures only
//! remove the affected reference from the payload.
//!
//! Existence check and create/update are two separate requests, so a
//! concurrent editor can still produce a duplicate post for one slug.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use postpress_markdown::{RenderOptions, post_path, read_post, render};
use postpress_shared::{
    PostIndex, PostIndexEntry, PostPayload, PublishError, Recoverable, RemotePost, Result,
};
use postpress_wordpress::{
    Method, TaxonomyKind, WpClient, endpoint_with_query, ensure_featured_media,
    find_existing_media, lookup_term, resolve_term,
};

use crate::pacing::{self, Pacer, Pause};
use crate::payload::{ResolvedRefs, build_payload, to_wp_date};

// ---------------------------------------------------------------------------
// Config & reports
// ---------------------------------------------------------------------------

/// Settings for a publish run.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Directory holding `<slug>.md` files.
    pub content_dir: PathBuf,
    /// Renderer options.
    pub render: RenderOptions,
    /// Category attached to every post.
    pub category: String,
    /// Statuses searched by the existence check.
    pub existing_statuses: Vec<String>,
    /// Read and look up only; never create, update or upload.
    pub dry_run: bool,
}

/// How a single post ended.
#[derive(Debug)]
pub enum PostOutcome {
    /// A new remote post was created.
    Created { id: u64 },
    /// The existing remote post was updated in place.
    Updated { id: u64 },
    /// Dry run: the post does not exist remotely yet.
    WouldCreate,
    /// Dry run: the post exists remotely.
    WouldUpdate { id: u64 },
    /// No markdown file; not a failure.
    Skipped { reason: String },
    /// The post could not be published.
    Failed { error: PublishError },
}

impl PostOutcome {
    /// Short status label used in console output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::WouldCreate => "would create",
            Self::WouldUpdate { .. } => "would update",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result of publishing one index entry.
#[derive(Debug)]
pub struct PostReport {
    pub slug: String,
    pub title: String,
    pub outcome: PostOutcome,
    /// Sub-steps that failed and were dropped from the payload.
    pub degraded: Vec<Recoverable>,
}

/// A post that failed, for the run summary.
#[derive(Debug)]
pub struct PostFailure {
    pub slug: String,
    pub title: String,
    pub error: PublishError,
}

/// Summary of a complete run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub created: usize,
    pub updated: usize,
    pub would_create: usize,
    pub would_update: usize,
    pub skipped: usize,
    pub failed: Vec<PostFailure>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Posts that reached their terminal success state.
    pub fn succeeded(&self) -> usize {
        self.created + self.updated + self.would_create + self.would_update
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    fn record(&mut self, report: PostReport) {
        match report.outcome {
            PostOutcome::Created { .. } => self.created += 1,
            PostOutcome::Updated { .. } => self.updated += 1,
            PostOutcome::WouldCreate => self.would_create += 1,
            PostOutcome::WouldUpdate { .. } => self.would_update += 1,
            PostOutcome::Skipped { .. } => self.skipped += 1,
            PostOutcome::Failed { error } => self.failed.push(PostFailure {
                slug: report.slug,
                title: report.title,
                error,
            }),
        }
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called before a post is processed.
    fn post_started(&self, slug: &str, current: usize, total: usize);
    /// Called when a post reaches a terminal state.
    fn post_finished(&self, report: &PostReport);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn post_started(&self, _slug: &str, _current: usize, _total: usize) {}
    fn post_finished(&self, _report: &PostReport) {}
    fn done(&self, _report: &RunReport) {}
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Runs the publish pipeline against one site.
pub struct Publisher<'a> {
    client: &'a WpClient,
    config: &'a PublishConfig,
    pacer: &'a dyn Pacer,
    /// Run-wide category id, cached after the first successful resolution.
    category_id: Option<u64>,
}

impl<'a> Publisher<'a> {
    pub fn new(client: &'a WpClient, config: &'a PublishConfig, pacer: &'a dyn Pacer) -> Self {
        Self {
            client,
            config,
            pacer,
            category_id: None,
        }
    }

    /// Publish every entry of the index, in order.
    #[instrument(skip_all, fields(posts = index.posts.len(), dry_run = self.config.dry_run))]
    pub async fn publish_all(
        &mut self,
        index: &PostIndex,
        progress: &dyn ProgressReporter,
    ) -> RunReport {
        let start = Instant::now();
        let total = index.posts.len();
        let mut run = RunReport::default();

        info!(total, "starting publish run");

        for (i, entry) in index.posts.iter().enumerate() {
            progress.post_started(&entry.slug, i + 1, total);

            let report = self.publish_post(entry).await;
            progress.post_finished(&report);
            run.record(report);

            if i + 1 < total {
                pacing::wait(self.pacer, Pause::AfterPost).await;
            }
        }

        run.elapsed = start.elapsed();
        progress.done(&run);

        info!(
            created = run.created,
            updated = run.updated,
            skipped = run.skipped,
            failed = run.failed.len(),
            elapsed_ms = run.elapsed.as_millis(),
            "publish run complete"
        );

        run
    }

    /// Publish a single entry. Never returns an error: failures are part of the report.
    #[instrument(skip_all, fields(slug = %entry.slug))]
    pub async fn publish_post(&mut self, entry: &PostIndexEntry) -> PostReport {
        let mut degraded = Vec::new();

        let outcome = match self.run_post(entry, &mut degraded).await {
            Ok(outcome) => outcome,
            Err(error) => {
                error!(
                    title = %entry.title,
                    status = ?error.status(),
                    error = %error,
                    "post failed"
                );
                PostOutcome::Failed { error }
            }
        };

        PostReport {
            slug: entry.slug.clone(),
            title: entry.title.clone(),
            outcome,
            degraded,
        }
    }

    async fn run_post(
        &mut self,
        entry: &PostIndexEntry,
        degraded: &mut Vec<Recoverable>,
    ) -> Result<PostOutcome> {
        // Loaded
        let markdown = match read_post(&self.config.content_dir, &entry.slug) {
            Ok(markdown) => markdown,
            Err(e) if e.is_not_found() => {
                let path = post_path(&self.config.content_dir, &entry.slug);
                warn!(path = %path.display(), "markdown file missing, skipping");
                return Ok(PostOutcome::Skipped {
                    reason: format!("no markdown file at {}", path.display()),
                });
            }
            Err(e) => return Err(e),
        };

        // Rendered
        let rendered = render(&markdown, &self.config.render);
        let date = to_wp_date(&entry.date)?;

        // TaxonomyResolved
        let tags = self.resolve_tags(&entry.tags, degraded).await;
        let categories = self.resolve_category(degraded).await.into_iter().collect();

        // MediaResolved
        let featured_media = self.resolve_media(entry, degraded).await;

        let payload = build_payload(
            entry,
            rendered.html,
            date,
            ResolvedRefs {
                tags,
                categories,
                featured_media,
            },
        );

        // Upserted
        let existing = self.find_existing_post(&entry.slug).await?;
        self.upsert(existing, &payload).await
    }

    /// Resolve each tag independently; a failing tag is dropped.
    async fn resolve_tags(&self, names: &[String], degraded: &mut Vec<Recoverable>) -> Vec<u64> {
        let mut ids = Vec::with_capacity(names.len());

        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                pacing::wait(self.pacer, Pause::BetweenSubRequests).await;
            }

            let resolved = if self.config.dry_run {
                lookup_term(self.client, TaxonomyKind::Tag, name).await
            } else {
                resolve_term(self.client, TaxonomyKind::Tag, name)
                    .await
                    .map(Some)
            };

            match resolved {
                Ok(Some(id)) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                Ok(None) => info!(tag = %name, "tag would be created"),
                Err(e) => {
                    warn!(error = %e, "dropping tag");
                    degraded.push(e);
                }
            }
        }

        ids
    }

    /// Resolve the run-wide category, once per run.
    async fn resolve_category(&mut self, degraded: &mut Vec<Recoverable>) -> Option<u64> {
        if let Some(id) = self.category_id {
            return Some(id);
        }

        let name = self.config.category.as_str();
        let resolved = if self.config.dry_run {
            lookup_term(self.client, TaxonomyKind::Category, name).await
        } else {
            resolve_term(self.client, TaxonomyKind::Category, name)
                .await
                .map(Some)
        };

        match resolved {
            Ok(id) => {
                self.category_id = id;
                id
            }
            Err(e) => {
                warn!(error = %e, "publishing without category");
                degraded.push(e);
                None
            }
        }
    }

    async fn resolve_media(
        &self,
        entry: &PostIndexEntry,
        degraded: &mut Vec<Recoverable>,
    ) -> Option<u64> {
        let source = entry.featured_image.as_deref()?;

        let resolved = if self.config.dry_run {
            find_existing_media(self.client, &entry.slug).await
        } else {
            ensure_featured_media(self.client, &entry.slug, Some(source)).await
        };

        match resolved {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, source, "publishing without featured media");
                degraded.push(e);
                None
            }
        }
    }

    /// Look the slug up across every status, so stale drafts are found too.
    async fn find_existing_post(&self, slug: &str) -> Result<Option<RemotePost>> {
        let statuses = self.config.existing_statuses.join(",");
        let endpoint = endpoint_with_query(
            "posts",
            &[("slug", slug), ("status", statuses.as_str()), ("context", "edit")],
        );
        let found: Vec<RemotePost> = self.client.get_json(&endpoint).await?;

        let mut found = found.into_iter();
        let first = found.next();
        Ok(match first {
            Some(post) if post.slug == slug => Some(post),
            Some(post) => Some(found.find(|p| p.slug == slug).unwrap_or(post)),
            None => None,
        })
    }

    async fn upsert(
        &self,
        existing: Option<RemotePost>,
        payload: &PostPayload,
    ) -> Result<PostOutcome> {
        match (existing, self.config.dry_run) {
            (Some(post), true) => Ok(PostOutcome::WouldUpdate { id: post.id }),
            (None, true) => Ok(PostOutcome::WouldCreate),
            (Some(post), false) => {
                let endpoint = format!("posts/{}", post.id);
                let updated: RemotePost = self
                    .client
                    .send_json(Method::PUT, &endpoint, payload)
                    .await?;
                info!(id = updated.id, "post updated");
                Ok(PostOutcome::Updated { id: updated.id })
            }
            (None, false) => {
                let created: RemotePost = self
                    .client
                    .send_json(Method::POST, "posts", payload)
                    .await?;
                info!(id = created.id, "post created");
                Ok(PostOutcome::Created { id: created.id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::{Value, json};
    use tempfile::TempDir;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use postpress_shared::{SubStep, WpConfig};

    use super::*;
    use crate::pacing::FixedPacing;

    const API: &str = "/wp-json/wp/v2";

    fn client_for(server: &MockServer) -> WpClient {
        let config = WpConfig {
            base_url: Url::parse(&server.uri()).unwrap(),
            username: "user".into(),
            app_password: "pass".into(),
        };
        WpClient::new(&config).unwrap()
    }

    fn publish_config(dir: &Path) -> PublishConfig {
        PublishConfig {
            content_dir: dir.to_path_buf(),
            render: RenderOptions::default(),
            category: "Blog".into(),
            existing_statuses: vec!["publish".into(), "draft".into(), "pending".into()],
            dry_run: false,
        }
    }

    fn entry(slug: &str, tags: &[&str]) -> PostIndexEntry {
        PostIndexEntry {
            slug: slug.into(),
            title: format!("Title {slug}"),
            excerpt: format!("About {slug}"),
            date: "2024-03-15".into(),
            author: "Sam".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            featured_image: None,
        }
    }

    fn content_dir(slugs: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for slug in slugs {
            std::fs::write(
                dir.path().join(format!("{slug}.md")),
                format!("# Title {slug}\n\nHello from {slug}.\n"),
            )
            .unwrap();
        }
        dir
    }

    async fn mount_category(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(format!("{API}/categories")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 1, "name": "Blog"}])),
            )
            .mount(server)
            .await;
    }

    async fn mount_no_existing_posts(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(format!("{API}/posts")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(server)
            .await;
    }

    async fn mount_create(server: &MockServer, id: u64, expected: u64) {
        Mock::given(method("POST"))
            .and(path(format!("{API}/posts")))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"id": id, "slug": "any", "status": "publish"})),
            )
            .expect(expected)
            .mount(server)
            .await;
    }

    async fn sent_bodies(server: &MockServer, verb: &str, url_path: &str) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r: &Request| r.method.as_str() == verb && r.url.path() == url_path)
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    async fn run(
        server: &MockServer,
        dir: &Path,
        dry_run: bool,
        entries: Vec<PostIndexEntry>,
    ) -> RunReport {
        let client = client_for(server);
        let mut config = publish_config(dir);
        config.dry_run = dry_run;
        let pacing = FixedPacing::none();
        let mut publisher = Publisher::new(&client, &config, &pacing);
        publisher
            .publish_all(&PostIndex { posts: entries }, &SilentProgress)
            .await
    }

    #[tokio::test]
    async fn creates_new_post_once_with_mapped_fields() {
        let server = MockServer::start().await;
        mount_category(&server).await;
        mount_no_existing_posts(&server).await;
        mount_create(&server, 100, 1).await;

        let dir = content_dir(&["fresh"]);
        let report = run(&server, dir.path(), false, vec![entry("fresh", &[])]).await;

        assert_eq!(report.created, 1);
        assert!(!report.has_failures());

        let bodies = sent_bodies(&server, "POST", &format!("{API}/posts")).await;
        assert_eq!(bodies.len(), 1);
        let body = &bodies[0];
        assert_eq!(body["slug"], "fresh");
        assert_eq!(body["title"], "Title fresh");
        assert_eq!(body["status"], "publish");
        assert_eq!(body["date"], "2024-03-15T00:00:00");
        assert_eq!(body["excerpt"], "About fresh");
        assert_eq!(body["categories"], json!([1]));
        assert_eq!(body["content"], "<p>Hello from fresh.</p>\n");
        assert!(body.get("featured_media").is_none());
    }

    #[tokio::test]
    async fn existing_post_is_updated_not_duplicated() {
        let server = MockServer::start().await;
        mount_category(&server).await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/posts")))
            .and(query_param("slug", "old"))
            .and(query_param("status", "publish,draft,pending"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 55, "slug": "old", "status": "draft"}])),
            )
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path(format!("{API}/posts/55")))
            .and(body_partial_json(json!({"slug": "old", "status": "publish"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 55, "slug": "old", "status": "publish"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        mount_create(&server, 1, 0).await;

        let dir = content_dir(&["old"]);
        let report = run(&server, dir.path(), false, vec![entry("old", &[])]).await;

        assert_eq!(report.updated, 1);
        assert_eq!(report.created, 0);
    }

    #[tokio::test]
    async fn missing_markdown_is_skipped_not_failed() {
        let server = MockServer::start().await;
        mount_category(&server).await;
        mount_no_existing_posts(&server).await;
        mount_create(&server, 100, 0).await;

        let dir = content_dir(&[]);
        let report = run(&server, dir.path(), false, vec![entry("ghost", &["Rust"])]).await;

        assert_eq!(report.skipped, 1);
        assert!(!report.has_failures());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_tag_is_dropped_and_post_still_published() {
        let server = MockServer::start().await;
        mount_category(&server).await;
        mount_no_existing_posts(&server).await;
        mount_create(&server, 100, 1).await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/tags")))
            .and(query_param("search", "Valid"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 10, "name": "Valid"}])),
            )
            .with_priority(1)
            .mount(&server)
            .await;

        // Anything else searching tags blows up.
        Mock::given(method("GET"))
            .and(path(format!("{API}/tags")))
            .respond_with(ResponseTemplate::new(500).set_body_string("tag search failed"))
            .with_priority(10)
            .mount(&server)
            .await;

        let dir = content_dir(&["tagged"]);
        let client = client_for(&server);
        let config = publish_config(dir.path());
        let pacing = FixedPacing::none();
        let mut publisher = Publisher::new(&client, &config, &pacing);

        let report = publisher
            .publish_post(&entry("tagged", &["Valid", "🚫Invalid🚫"]))
            .await;

        assert!(matches!(report.outcome, PostOutcome::Created { id: 100 }));
        assert_eq!(report.degraded.len(), 1);
        assert_eq!(report.degraded[0].step, SubStep::Tag("🚫Invalid🚫".into()));

        let bodies = sent_bodies(&server, "POST", &format!("{API}/posts")).await;
        assert_eq!(bodies[0]["tags"], json!([10]));
    }

    #[tokio::test]
    async fn missing_featured_image_publishes_without_media() {
        let server = MockServer::start().await;
        mount_category(&server).await;
        mount_no_existing_posts(&server).await;
        mount_create(&server, 100, 1).await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/media")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/missing.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("{API}/media")))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let mut post = entry("x", &[]);
        post.featured_image = Some(format!("{}/missing.jpg", server.uri()));

        let dir = content_dir(&["x"]);
        let client = client_for(&server);
        let config = publish_config(dir.path());
        let pacing = FixedPacing::none();
        let mut publisher = Publisher::new(&client, &config, &pacing);
        let report = publisher.publish_post(&post).await;

        assert!(matches!(report.outcome, PostOutcome::Created { .. }));
        assert_eq!(report.degraded.len(), 1);
        assert_eq!(report.degraded[0].step, SubStep::FeaturedMedia);

        let bodies = sent_bodies(&server, "POST", &format!("{API}/posts")).await;
        assert!(bodies[0].get("featured_media").is_none());
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_run() {
        let server = MockServer::start().await;
        mount_category(&server).await;
        mount_no_existing_posts(&server).await;

        Mock::given(method("POST"))
            .and(path(format!("{API}/posts")))
            .and(body_partial_json(json!({"slug": "a"})))
            .respond_with(ResponseTemplate::new(500).set_body_string("database error"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("{API}/posts")))
            .and(body_partial_json(json!({"slug": "b"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"id": 2, "slug": "b", "status": "publish"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = content_dir(&["a", "b"]);
        let report = run(
            &server,
            dir.path(),
            false,
            vec![entry("a", &[]), entry("b", &[])],
        )
        .await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.has_failures());
        let failure = &report.failed[0];
        assert_eq!(failure.slug, "a");
        assert_eq!(failure.error.status(), Some(500));
        assert!(failure.error.to_string().contains("database error"));
    }

    #[tokio::test]
    async fn rerun_updates_without_duplicates_or_drift() {
        let server = MockServer::start().await;
        mount_category(&server).await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/tags")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 7, "name": "Rust"}])),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("{API}/tags")))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        // First lookup finds nothing; afterwards the created post exists.
        Mock::given(method("GET"))
            .and(path(format!("{API}/posts")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/posts")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 100, "slug": "same", "status": "publish"}])),
            )
            .with_priority(5)
            .mount(&server)
            .await;

        mount_create(&server, 100, 1).await;

        Mock::given(method("PUT"))
            .and(path(format!("{API}/posts/100")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 100, "slug": "same", "status": "publish"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = content_dir(&["same"]);
        let first = run(&server, dir.path(), false, vec![entry("same", &["Rust"])]).await;
        let second = run(&server, dir.path(), false, vec![entry("same", &["Rust"])]).await;

        assert_eq!(first.created, 1);
        assert_eq!(second.updated, 1);

        let created = sent_bodies(&server, "POST", &format!("{API}/posts")).await;
        let updated = sent_bodies(&server, "PUT", &format!("{API}/posts/100")).await;
        assert_eq!(created[0], updated[0]);
    }

    #[tokio::test]
    async fn category_resolved_once_per_run() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/categories")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 1, "name": "blog"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        mount_no_existing_posts(&server).await;
        mount_create(&server, 100, 3).await;

        let dir = content_dir(&["p1", "p2", "p3"]);
        let report = run(
            &server,
            dir.path(),
            false,
            vec![entry("p1", &[]), entry("p2", &[]), entry("p3", &[])],
        )
        .await;

        assert_eq!(report.created, 3);
    }

    #[tokio::test]
    async fn bad_date_fails_post_before_any_request() {
        let server = MockServer::start().await;
        let dir = content_dir(&["dated"]);
        let mut post = entry("dated", &[]);
        post.date = "someday".into();

        let report = run(&server, dir.path(), false, vec![post]).await;

        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].error,
            PublishError::Validation { .. }
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dry_run_never_writes() {
        let server = MockServer::start().await;
        mount_category(&server).await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/tags")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/posts")))
            .and(query_param("slug", "known"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 8, "slug": "known", "status": "publish"}])),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/posts")))
            .and(query_param("slug", "unknown"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let dir = content_dir(&["known", "unknown"]);
        let report = run(
            &server,
            dir.path(),
            true,
            vec![entry("known", &["New Tag"]), entry("unknown", &[])],
        )
        .await;

        assert_eq!(report.would_update, 1);
        assert_eq!(report.would_create, 1);
        assert!(!report.has_failures());

        let writes = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.as_str() != "GET")
            .count();
        assert_eq!(writes, 0);
    }

    /// Records every pause it is asked about, never sleeps.
    #[derive(Default)]
    struct RecordingPacer {
        pauses: std::sync::Mutex<Vec<Pause>>,
    }

    impl Pacer for RecordingPacer {
        fn delay(&self, pause: Pause) -> Duration {
            self.pauses.lock().unwrap().push(pause);
            Duration::ZERO
        }
    }

    #[tokio::test]
    async fn pauses_between_tags_and_between_posts_only() {
        let server = MockServer::start().await;
        mount_category(&server).await;
        mount_no_existing_posts(&server).await;
        mount_create(&server, 100, 2).await;

        Mock::given(method("GET"))
            .and(path(format!("{API}/tags")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "a"},
                {"id": 2, "name": "b"},
                {"id": 3, "name": "c"}
            ])))
            .mount(&server)
            .await;

        let dir = content_dir(&["one", "two"]);
        let client = client_for(&server);
        let config = publish_config(dir.path());
        let pacer = RecordingPacer::default();
        let mut publisher = Publisher::new(&client, &config, &pacer);

        let index = PostIndex {
            posts: vec![entry("one", &["a", "b", "c"]), entry("two", &["a", "b", "c"])],
        };
        let report = publisher.publish_all(&index, &SilentProgress).await;
        assert_eq!(report.created, 2);

        let pauses = pacer.pauses.lock().unwrap().clone();
        assert_eq!(
            pauses,
            vec![
                Pause::BetweenSubRequests,
                Pause::BetweenSubRequests,
                Pause::AfterPost,
                Pause::BetweenSubRequests,
                Pause::BetweenSubRequests,
            ]
        );
    }
}

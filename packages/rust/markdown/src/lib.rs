//! Markdown-to-HTML rendering for post bodies.
//!
//! Strips frontmatter and the leading title from a post's markdown source,
//! then renders it to the HTML fragment WordPress stores as post content,
//! using `pulldown-cmark`.

mod preprocess;

use std::path::{Path, PathBuf};

use pulldown_cmark::{Options, Parser, html};
use tracing::{debug, instrument};

use postpress_shared::{PublishError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Result of rendering a post body.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPost {
    /// The HTML fragment to send as `content`.
    pub html: String,
}

/// Options for rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Drop a leading `# Title` line before rendering.
    pub strip_title: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { strip_title: true }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Render a post's markdown source to HTML.
///
/// Pure: the same input always yields the same output, so re-publishing an
/// unchanged post sends identical content.
#[instrument(skip_all, fields(len = markdown.len()))]
pub fn render(markdown: &str, opts: &RenderOptions) -> RenderedPost {
    let body = preprocess::run_pipeline(markdown, opts.strip_title);

    let parser = Parser::new_ext(&body, markdown_options());
    let mut html_out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut html_out, parser);

    debug!(html_len = html_out.len(), "render complete");

    RenderedPost { html: html_out }
}

/// Extensions enabled for post bodies.
fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

// ---------------------------------------------------------------------------
// Source files
// ---------------------------------------------------------------------------

/// Path of a post's markdown source: `<content_dir>/<slug>.md`.
pub fn post_path(content_dir: &Path, slug: &str) -> PathBuf {
    content_dir.join(format!("{slug}.md"))
}

/// Read a post's markdown source.
pub fn read_post(content_dir: &Path, slug: &str) -> Result<String> {
    let path = post_path(content_dir, slug);
    std::fs::read_to_string(&path).map_err(|e| PublishError::io(path, e))
}

//! Source clean-up passes applied before rendering.
//!
//! Each pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Run the pre-render pipeline on a post's markdown source.
pub(crate) fn run_pipeline(md: &str, strip_title: bool) -> String {
    let mut result = normalize_line_endings(md);

    result = strip_frontmatter(&result);
    if strip_title {
        result = strip_leading_title(&result);
    }
    result = trim_leading_blank_lines(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Line endings
// ---------------------------------------------------------------------------

fn normalize_line_endings(md: &str) -> String {
    md.replace("\r\n", "\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Frontmatter
// ---------------------------------------------------------------------------

/// Remove a leading YAML frontmatter block. Metadata comes from the index.
fn strip_frontmatter(md: &str) -> String {
    static FRONTMATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\A---[ \t]*\n(?s:.*?)\n---[ \t]*(\n|\z)").expect("valid regex")
    });

    FRONTMATTER_RE.replace(md, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Leading title
// ---------------------------------------------------------------------------

/// Drop the first line if it is an H1; the title is published separately.
fn strip_leading_title(md: &str) -> String {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\A\s*#[ \t]+[^\n]*(\n|\z)").expect("valid regex"));

    H1_RE.replace(md, "").to_string()
}


// ---------------------------------------------------------------------------
// Pass 4: Whitespace
// ---------------------------------------------------------------------------

/// Drop whitespace-only lines at the top, keeping the first real line's indent.
fn trim_leading_blank_lines(md: &str) -> String {
    let mut rest = md;
    while let Some((line, tail)) = rest.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        rest = tail;
    }
    if rest.trim().is_empty() {
        return String::new();
    }
    rest.to_string()
}

//! WordPress REST API access: transport, taxonomy terms, and media.
//!
//! This crate provides:
//! - [`client`]: authenticated transport with typed error mapping
//! - [`taxonomy`]: tag/category name → id resolution, creating terms on first use
//! - [`media`]: featured-image lookup, download and upload

pub mod client;
pub mod media;
pub mod taxonomy;

pub use client::{
    ApiResponse, DownloadedImage, MAX_REDIRECTS, Timeouts, WpClient, endpoint_with_query,
};
pub use media::{ensure_featured_media, featured_filename, find_existing_media};
pub use reqwest::Method;
pub use taxonomy::{TaxonomyKind, lookup_term, resolve_term};

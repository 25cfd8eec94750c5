//! Shared types, error model, and configuration for postpress.
//!
//! This crate is the foundation depended on by all other postpress crates.
//! It provides:
//! - [`PublishError`] and [`Recoverable`], the error model
//! - Domain types ([`PostIndex`], [`PostIndexEntry`], [`PostPayload`], remote resources)
//! - Configuration ([`AppConfig`], [`WpConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ContentConfig, PacingConfig, PublishSettings, WpConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, normalize_base_url,
};
pub use error::{PublishError, Recoverable, Result, SubStep};
pub use types::{
    MediaAsset, PostIndex, PostIndexEntry, PostPayload, RemotePost, TaxonomyTerm,
};

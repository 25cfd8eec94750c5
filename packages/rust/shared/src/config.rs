//! Application configuration for postpress.
//!
//! Site credentials come from the environment (`WP_URL`, `WP_USERNAME`,
//! `WP_APP_PASSWORD`) and are never read from disk. Everything else lives in
//! an optional `postpress.toml`, looked up in the working directory and then
//! at `~/.postpress/postpress.toml`. CLI flags override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PublishError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "postpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".postpress";

/// Environment variable holding the site URL.
pub const ENV_WP_URL: &str = "WP_URL";
/// Environment variable holding the WordPress user name.
pub const ENV_WP_USERNAME: &str = "WP_USERNAME";
/// Environment variable holding the application password.
pub const ENV_WP_APP_PASSWORD: &str = "WP_APP_PASSWORD";

/// Path of the REST namespace under the site root.
const REST_PREFIX: &str = "wp-json/wp/v2/";

// ---------------------------------------------------------------------------
// Config file structs (matching postpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the index and markdown files live.
    #[serde(default)]
    pub content: ContentConfig,

    /// Remote publishing behaviour.
    #[serde(default)]
    pub publish: PublishSettings,

    /// Request pacing.
    #[serde(default)]
    pub pacing: PacingConfig,
}

/// `[content]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Path to the JSON post index.
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Directory holding one `<slug>.md` per post.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Drop a leading `# Title` heading from the rendered body.
    #[serde(default = "default_true")]
    pub strip_title: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            content_dir: default_content_dir(),
            strip_title: true,
        }
    }
}

fn default_index_path() -> String {
    "content/posts/index.json".into()
}
fn default_content_dir() -> String {
    "content/posts".into()
}
fn default_true() -> bool {
    true
}

/// `[publish]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Category attached to every published post.
    #[serde(default = "default_category")]
    pub category: String,

    /// Statuses searched when checking whether a post already exists.
    #[serde(default = "default_status_filter")]
    pub existing_statuses: Vec<String>,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            category: default_category(),
            existing_statuses: default_status_filter(),
        }
    }
}

fn default_category() -> String {
    "Blog".into()
}
fn default_status_filter() -> Vec<String> {
    ["publish", "draft", "pending", "future", "private"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// `[pacing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause after each post, in milliseconds.
    #[serde(default = "default_after_post_ms")]
    pub after_post_ms: u64,

    /// Pause between dependent sub-requests (tag creation), in milliseconds.
    #[serde(default = "default_between_requests_ms")]
    pub between_requests_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            after_post_ms: default_after_post_ms(),
            between_requests_ms: default_between_requests_ms(),
        }
    }
}

fn default_after_post_ms() -> u64 {
    500
}
fn default_between_requests_ms() -> u64 {
    250
}

// ---------------------------------------------------------------------------
// Site config (runtime, from the environment)
// ---------------------------------------------------------------------------

/// Connection settings for the target WordPress site.
///
/// Constructed once at startup and passed by reference to the client.
#[derive(Clone)]
pub struct WpConfig {
    /// Site root, normalized: scheme present, no trailing slash.
    pub base_url: Url,
    pub username: String,
    pub app_password: String,
}

impl std::fmt::Debug for WpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WpConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

impl WpConfig {
    /// Read the site settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the site settings from any key lookup (the environment in
    /// production, a map in tests). Every variable is required and non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| -> Option<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&str> = [ENV_WP_URL, ENV_WP_USERNAME, ENV_WP_APP_PASSWORD]
            .into_iter()
            .filter(|name| get(name).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(PublishError::config(format!(
                "missing required environment variable(s): {}",
                missing.join(", ")
            )));
        }

        let raw_url = get(ENV_WP_URL).unwrap_or_default();
        Ok(Self {
            base_url: normalize_base_url(&raw_url)?,
            username: get(ENV_WP_USERNAME).unwrap_or_default(),
            app_password: get(ENV_WP_APP_PASSWORD).unwrap_or_default(),
        })
    }

    /// Root of the `wp/v2` REST namespace, always ending in `/`.
    pub fn api_root(&self) -> Url {
        let mut root = self.base_url.clone();
        let path = format!("{}/{REST_PREFIX}", root.path().trim_end_matches('/'));
        root.set_path(&path);
        root
    }
}

/// Strip trailing slashes and default to `https://` when no scheme is given.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| PublishError::config(format!("invalid {ENV_WP_URL} '{raw}': {e}")))?;
    if url.host_str().is_none() {
        return Err(PublishError::config(format!(
            "invalid {ENV_WP_URL} '{raw}': no host"
        )));
    }
    Ok(url)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.postpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PublishError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.postpress/postpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the config: `./postpress.toml` first, then the user config file.
/// Returns defaults if neither exists.
pub fn load_config() -> Result<AppConfig> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PublishError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PublishError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file into `dir`. Returns the path to the created file.
pub fn init_config(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| PublishError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PublishError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PublishError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

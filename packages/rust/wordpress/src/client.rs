//! Authenticated transport for the WordPress REST API.
//!
//! Every call goes through [`WpClient::request`] (or its typed wrappers), which
//! maps each failure mode to its own [`PublishError`] variant: non-2xx status,
//! connection failure, and timeout. Image downloads use a second client with
//! redirects disabled so the redirect limit can be reported precisely.

use std::time::Duration;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use postpress_shared::{PublishError, Result, WpConfig};

/// User-Agent string for all requests.
const USER_AGENT: &str = concat!("postpress/", env!("CARGO_PKG_VERSION"));

/// Maximum redirects followed for API calls and image downloads.
pub const MAX_REDIRECTS: usize = 5;

/// Maximum number of response-body characters kept in an error.
const SNIPPET_LEN: usize = 200;

/// Default content type assumed for downloaded images.
const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

/// Time bounds applied per request.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// JSON API calls.
    pub api: Duration,
    /// Media uploads and image downloads.
    pub upload: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            api: Duration::from_secs(30),
            upload: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// The body parsed as JSON.
    Json(Value),
    /// The body was not JSON (or empty).
    Text(String),
}

impl ApiResponse {
    fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(body),
        }
    }

    /// Decode a JSON body into `T`.
    pub fn decode<T: DeserializeOwned>(self, endpoint: &str) -> Result<T> {
        match self {
            Self::Json(value) => serde_json::from_value(value).map_err(|e| {
                PublishError::parse(format!("{endpoint}: unexpected response shape: {e}"))
            }),
            Self::Text(text) => Err(PublishError::parse(format!(
                "{endpoint}: expected JSON, got: {}",
                snippet(&text)
            ))),
        }
    }
}

/// Raw bytes of a downloaded image.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    /// MIME type without parameters, e.g. `image/png`.
    pub content_type: String,
    /// URL the bytes were finally served from.
    pub final_url: Url,
}

// ---------------------------------------------------------------------------
// WpClient
// ---------------------------------------------------------------------------

/// HTTP client bound to one WordPress site.
pub struct WpClient {
    api: Client,
    download: Client,
    api_root: Url,
    username: String,
    app_password: String,
    timeouts: Timeouts,
}

impl WpClient {
    /// Create a client for the configured site with default timeouts.
    pub fn new(config: &WpConfig) -> Result<Self> {
        Self::with_timeouts(config, Timeouts::default())
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(config: &WpConfig, timeouts: Timeouts) -> Result<Self> {
        let api = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeouts.api)
            .build()
            .map_err(|e| PublishError::config(format!("failed to build HTTP client: {e}")))?;

        let download = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeouts.upload)
            .build()
            .map_err(|e| PublishError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api,
            download,
            api_root: config.api_root(),
            username: config.username.clone(),
            app_password: config.app_password.clone(),
            timeouts,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.api_root
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| PublishError::validation(format!("invalid endpoint '{endpoint}': {e}")))
    }

    fn authed(&self, method: Method, url: Url) -> RequestBuilder {
        self.api
            .request(method, url)
            .basic_auth(&self.username, Some(&self.app_password))
    }

    /// Issue an authenticated API request and decode the response body.
    ///
    /// `endpoint` is relative to the REST root and may carry a query string.
    #[instrument(skip(self, body))]
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = self.endpoint_url(endpoint)?;
        let mut builder = self.authed(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(&method, endpoint, builder, self.timeouts.api)
            .await
    }

    /// `GET` an endpoint and decode its JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::GET, endpoint, None)
            .await?
            .decode(endpoint)
    }

    /// Send a JSON body and decode the JSON response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let value = serde_json::to_value(body)
            .map_err(|e| PublishError::parse(format!("{endpoint}: cannot encode body: {e}")))?;
        self.request(method, endpoint, Some(&value))
            .await?
            .decode(endpoint)
    }

    /// Upload raw bytes (a media file) with the given content type and filename.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        endpoint: &str,
        bytes: Vec<u8>,
        content_type: &str,
        filename: &str,
    ) -> Result<ApiResponse> {
        let url = self.endpoint_url(endpoint)?;
        let builder = self
            .authed(Method::POST, url)
            .header(CONTENT_TYPE, content_type)
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            )
            .body(bytes);
        self.execute(&Method::POST, endpoint, builder, self.timeouts.upload)
            .await
    }

    async fn execute(
        &self,
        method: &Method,
        endpoint: &str,
        builder: RequestBuilder,
        timeout: Duration,
    ) -> Result<ApiResponse> {
        let response = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| send_error(e, method, endpoint, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| send_error(e, method, endpoint, timeout))?;

        debug!(status = status.as_u16(), len = body.len(), "response received");

        if !status.is_success() {
            return Err(PublishError::Transport {
                status: status.as_u16(),
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                snippet: snippet(&body),
                details: serde_json::from_str(&body).ok(),
            });
        }

        Ok(ApiResponse::from_body(body))
    }

    /// Download an image, following up to [`MAX_REDIRECTS`] redirects.
    ///
    /// Downloads are unauthenticated; the image host is usually not the site.
    #[instrument(skip(self))]
    pub async fn download(&self, url: &str) -> Result<DownloadedImage> {
        let mut current = Url::parse(url)
            .map_err(|e| PublishError::validation(format!("invalid image URL '{url}': {e}")))?;
        let mut redirects = 0;

        loop {
            let response = self
                .download
                .get(current.clone())
                .send()
                .await
                .map_err(|e| send_error(e, &Method::GET, current.as_str(), self.timeouts.upload))?;

            let status = response.status();

            if status.is_redirection() {
                if redirects >= MAX_REDIRECTS {
                    return Err(PublishError::TooManyRedirects {
                        url: url.to_string(),
                        limit: MAX_REDIRECTS,
                    });
                }
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| PublishError::ImageFetch {
                        url: current.to_string(),
                        status: status.as_u16(),
                    })?;
                current = current.join(location).map_err(|e| {
                    PublishError::validation(format!("bad redirect location '{location}': {e}"))
                })?;
                redirects += 1;
                debug!(%current, redirects, "following redirect");
                continue;
            }

            if status != StatusCode::OK {
                return Err(PublishError::ImageFetch {
                    url: current.to_string(),
                    status: status.as_u16(),
                });
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(';').next())
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string());

            let bytes = response
                .bytes()
                .await
                .map_err(|e| send_error(e, &Method::GET, current.as_str(), self.timeouts.upload))?;

            return Ok(DownloadedImage {
                bytes: bytes.to_vec(),
                content_type,
                final_url: current,
            });
        }
    }

    /// Probe the API with the configured credentials.
    ///
    /// `users/me` requires authentication, so this catches a wrong URL, an
    /// unreachable host and bad credentials in one round trip.
    #[instrument(skip(self))]
    pub async fn check_connectivity(&self) -> Result<()> {
        self.request(Method::GET, "users/me?context=edit", None)
            .await
            .map(|_| ())
            .map_err(|e| PublishError::connectivity(e.to_string()))
    }
}

/// Build `path?k=v&...` with form-encoded values.
pub fn endpoint_with_query(path: &str, params: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

fn send_error(
    e: reqwest::Error,
    method: &Method,
    endpoint: &str,
    timeout: Duration,
) -> PublishError {
    if e.is_timeout() {
        PublishError::Timeout {
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            secs: timeout.as_secs(),
        }
    } else {
        PublishError::Network {
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
    }
}

/// First [`SNIPPET_LEN`] characters of a body, on a char boundary.
fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

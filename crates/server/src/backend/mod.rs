//! Backend-as-a-service client.
//!
//! The hosted backend owns auth, object storage and edge functions. This
//! client speaks its REST endpoints:
//!
//! - `POST {url}/auth/v1/token?grant_type=password` - sign in
//! - `POST {url}/auth/v1/recover` - password recovery email
//! - `POST {url}/storage/v1/object/{bucket}/{path}` - upload
//! - `POST {url}/functions/v1/{name}` - edge functions
//!
//! Auth calls use the anon key. Storage and functions use the service key,
//! which never leaves the server.

mod error;
pub mod storage;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use storecraft_core::StorefrontId;

use crate::config::BackendConfig;
use crate::models::IconSet;

pub use error::{ApiErrorResponse, BackendError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Edge function that renders a storefront's static HTML shell.
pub const GENERATE_HTML_FUNCTION: &str = "generate-storefront-html";
/// Edge function that resizes an uploaded icon into every PWA size.
pub const RESIZE_ICON_FUNCTION: &str = "resize-icon";

/// Signed-in backend user.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Tokens returned by a successful sign-in.
#[derive(Debug, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub path: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of one file in a multi-file upload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Uploaded { file_name: String, url: String },
    Failed { file_name: String, error: String },
}

impl UploadOutcome {
    /// Public URL if the upload succeeded.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Uploaded { url, .. } => Some(url),
            Self::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateHtmlRequest {
    storefront_id: StorefrontId,
}

/// Response of the HTML generation function.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSite {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResizeIconRequest<'a> {
    storefront_id: StorefrontId,
    source_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResizeIconResponse {
    /// Keyed by pixel size, `"192"` or `"192x192"`.
    icons: BTreeMap<String, String>,
}

impl ResizeIconResponse {
    fn into_icon_set(self) -> IconSet {
        let mut icons = IconSet::default();
        for (size, url) in self.icons {
            let edge = size.split('x').next().unwrap_or_default().parse::<u16>();
            let stored = edge.is_ok_and(|edge| icons.set(edge, Some(url)));
            if !stored {
                warn!(size = %size, "Ignoring unexpected icon size from resize function");
            }
        }
        icons
    }
}

/// Client for the backend's REST endpoints.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: SecretString,
    bucket: String,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
                service_key: config.service_key.clone(),
                bucket: config.storage_bucket.clone(),
            }),
        })
    }

    /// The shared HTTP client, for fetching public assets.
    #[must_use]
    pub fn http(&self) -> reqwest::Client {
        self.inner.client.clone()
    }

    /// Public URL of a stored object.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.inner.base_url, self.inner.bucket
        )
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidCredentials` for a rejected login,
    /// `BackendError::RateLimited` on HTTP 429.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(url)
            .header("apikey", &self.inner.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::InvalidCredentials);
        }
        parse_json(response).await
    }

    /// Send a password recovery email.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::RateLimited` when the backend answers 429.
    #[instrument(skip(self))]
    pub async fn recover_password(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), BackendError> {
        let url = format!(
            "{}/auth/v1/recover?redirect_to={}",
            self.inner.base_url,
            urlencoding::encode(redirect_to)
        );
        let response = self
            .inner
            .client
            .post(url)
            .header("apikey", &self.inner.anon_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        check_status(response).await.map(drop)
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Upload (or overwrite) an object and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` if storage rejects the upload.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let url = format!(
            "{}/storage/v1/object/{}/{path}",
            self.inner.base_url, self.inner.bucket
        );
        let response = self
            .inner
            .client
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        check_status(response).await?;
        debug!(path, "Uploaded object");
        Ok(self.public_url(path))
    }

    /// Upload several files independently.
    ///
    /// A failed file does not stop the others, and files uploaded before a
    /// failure are kept.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn upload_many(&self, files: Vec<UploadFile>) -> Vec<UploadOutcome> {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let outcome = match self.upload(&file.path, &file.content_type, file.bytes).await {
                Ok(url) => UploadOutcome::Uploaded {
                    file_name: file.file_name,
                    url,
                },
                Err(e) => {
                    warn!(file = %file.file_name, error = %e, "Upload failed");
                    UploadOutcome::Failed {
                        file_name: file.file_name,
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    // =========================================================================
    // Edge functions
    // =========================================================================

    /// Invoke an edge function with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` for error statuses and
    /// `BackendError::Parse` for unexpected responses.
    #[instrument(skip(self, body))]
    pub async fn invoke<B, R>(&self, function: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/functions/v1/{function}", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .json(body)
            .send()
            .await?;

        parse_json(response).await
    }

    /// Regenerate a storefront's static HTML shell.
    ///
    /// # Errors
    ///
    /// Returns the function's error.
    pub async fn generate_storefront_html(
        &self,
        storefront_id: StorefrontId,
    ) -> Result<GeneratedSite, BackendError> {
        self.invoke(GENERATE_HTML_FUNCTION, &GenerateHtmlRequest { storefront_id })
            .await
    }

    /// Resize an uploaded icon into every PWA size.
    ///
    /// # Errors
    ///
    /// Returns the function's error.
    pub async fn resize_icon(
        &self,
        storefront_id: StorefrontId,
        source_url: &str,
    ) -> Result<IconSet, BackendError> {
        let response: ResizeIconResponse = self
            .invoke(
                RESIZE_ICON_FUNCTION,
                &ResizeIconRequest {
                    storefront_id,
                    source_url,
                },
            )
            .await?;
        Ok(response.into_icon_set())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.inner.service_key.expose_secret())
    }
}

/// Turn an error status into a `BackendError`, passing successes through.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(BackendError::RateLimited(retry_after));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .ok()
        .and_then(ApiErrorResponse::into_message)
        .unwrap_or(body);

    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let body = check_status(response).await?.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")))
}

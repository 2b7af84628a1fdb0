//! Nova admin API client
//!
//! Session-authenticated, read-only access to the legacy admin panel. The
//! client logs in once via `/auth/login` (the session cookie lives in the
//! reqwest cookie jar) and then issues paginated reads for users, events and
//! event applications.
//!
//! No retries and no explicit timeouts: a failed page is a failed page, and
//! the caller decides what to skip.

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::nova::resource::NovaResource;

/// Nova client specific errors
#[derive(Debug, Error)]
pub enum NovaError {
    #[error("Nova authentication failed: {0}")]
    Authentication(String),

    #[error("Nova request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid Nova URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Malformed Nova response: {0}")]
    MalformedResponse(String),
}

/// Credentials for the legacy admin panel.
#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub struct NovaCredentials {
    /// Base URL of the Nova instance, e.g. `https://admin.example.org`
    pub base_url: String,
    /// Admin account email
    pub email: String,
    /// Admin account password
    pub password: String,
}

/// One page of Nova resources.
///
/// List endpoints fill `resources` and possibly `next_page_url`; show
/// endpoints fill `resource`.
#[derive(Debug, Default)]
pub struct PageEnvelope {
    pub resources: Vec<NovaResource>,
    pub resource: Option<NovaResource>,
    pub next_page_url: Option<String>,
}

impl PageEnvelope {
    fn from_json(body: &JsonValue) -> Self {
        let mut resources = Vec::new();
        if let Some(entries) = body.get("resources").and_then(JsonValue::as_array) {
            for entry in entries {
                match NovaResource::from_value(entry) {
                    Some(resource) => resources.push(resource),
                    // Unaddressable records are dropped here; the import
                    // treats them as data-quality gaps, not failures.
                    None => warn!("Dropping Nova resource without a usable id"),
                }
            }
        }

        let resource = body.get("resource").and_then(NovaResource::from_value);

        let next_page_url = body
            .get("next_page_url")
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        Self {
            resources,
            resource,
            next_page_url,
        }
    }
}

/// Authenticated session against one Nova instance.
pub struct NovaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NovaClient {
    /// Log in against the Nova admin panel and return a session-holding
    /// client. A 401/403 from the login endpoint is an authentication
    /// failure, which callers treat as fatal for the whole batch.
    pub async fn authenticate(credentials: &NovaCredentials) -> Result<Self, NovaError> {
        let base_url = Url::parse(credentials.base_url.trim_end_matches('/'))?;

        let http = reqwest::Client::builder().cookie_store(true).build()?;

        let login_url = base_url.join("/auth/login")?;
        let response = http
            .post(login_url)
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(NovaError::Authentication(format!(
                "login rejected ({}): {}",
                status.as_u16(),
                body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NovaError::Api {
                status: status.as_u16(),
                message: format!("login endpoint returned: {}", body),
            });
        }

        Ok(Self { http, base_url })
    }

    /// Issue a GET against `path` (relative to the base URL, or an absolute
    /// URL as handed back in `next_page_url`) and parse the resource
    /// envelope.
    pub async fn request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<PageEnvelope, NovaError> {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path)?
        } else {
            self.base_url.join(path)?
        };

        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(NovaError::Authentication(format!(
                "session rejected ({}): {}",
                status.as_u16(),
                body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NovaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| NovaError::MalformedResponse(e.to_string()))?;

        Ok(PageEnvelope::from_json(&body))
    }

    /// Search users by email. The Nova search endpoint does substring
    /// matching, so the result set may contain near-misses; callers must
    /// select the exact match themselves.
    pub async fn search_users(&self, email: &str) -> Result<Vec<NovaResource>, NovaError> {
        let page = self
            .request("/api/users", &[("search", email.to_string())])
            .await?;
        Ok(page.resources)
    }

    /// Fetch the full user record. Search results are abbreviated
    /// projections; this fills in the remaining fields.
    pub async fn fetch_user(&self, user_id: i64) -> Result<Option<NovaResource>, NovaError> {
        let page = self.request(&format!("/api/users/{}", user_id), &[]).await?;
        Ok(page.resource)
    }

    /// Fetch one event record.
    pub async fn fetch_event(&self, event_id: i64) -> Result<Option<NovaResource>, NovaError> {
        let page = self
            .request(&format!("/api/events/{}", event_id), &[])
            .await?;
        Ok(page.resource)
    }

    /// First page of a user's event applications.
    pub async fn event_applications(&self, user_id: i64) -> Result<PageEnvelope, NovaError> {
        self.request(
            "/api/event_applications",
            &[("user_id", user_id.to_string())],
        )
        .await
    }

    /// Follow a `next_page_url` from a previous page.
    pub async fn next_page(&self, next_page_url: &str) -> Result<PageEnvelope, NovaError> {
        self.request(next_page_url, &[]).await
    }
}

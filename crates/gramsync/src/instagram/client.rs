//! Instagram Graph API client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde_json::Value;
use url::Url;

use super::error::{InstagramError, error_message_from_body};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// Default Graph API base URL, pinned to API version v25.0.
pub const DEFAULT_BASE_URL: &str = "https://graph.instagram.com/v25.0";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Query string or form parameters, in send order.
pub type Params = [(String, String)];

/// Authenticated client for the Instagram Graph API.
///
/// The base URL and access token are fixed at construction. The client keeps
/// no per-request state, so one instance can be shared across calls.
#[derive(Clone)]
pub struct GraphClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GraphClient {
    /// Create a client backed by reqwest.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = GraphClient::new(DEFAULT_BASE_URL, &token, DEFAULT_TIMEOUT)?;
    /// let me = client.get("me", &[]).await?;
    /// ```
    pub fn new(base_url: &str, token: &str, timeout: StdDuration) -> Result<Self, InstagramError> {
        Url::parse(base_url)
            .map_err(|e| InstagramError::Config(format!("invalid base URL {base_url}: {e}")))?;
        let transport = ReqwestTransport::with_timeout(timeout)
            .map_err(|e| InstagramError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(
            base_url,
            token,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        base_url: &str,
        token: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reduce an absolute continuation link to the relative path `get` expects.
    ///
    /// Links pointing outside the base URL are returned unchanged; `get`
    /// accepts absolute URLs as well.
    pub fn relative_path<'u>(&self, link: &'u str) -> &'u str {
        match link.strip_prefix(self.base_url.as_str()) {
            Some(rest) => rest.trim_start_matches('/'),
            None => link,
        }
    }

    /// Build the full request URL for `path`, appending `params` and the access
    /// token (unless the path already carries one).
    pub(crate) fn build_url(&self, path: &str, params: &Params) -> Result<String, InstagramError> {
        let raw = if path.starts_with("https://") || path.starts_with("http://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        };

        let mut url = Url::parse(&raw)
            .map_err(|e| InstagramError::Config(format!("invalid request URL {raw}: {e}")))?;

        let has_token = url.query_pairs().any(|(k, _)| k == "access_token");
        if !params.is_empty() || !has_token {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            if !has_token {
                pairs.append_pair("access_token", &self.token);
            }
        }

        Ok(url.into())
    }

    /// Authenticated GET. Fails on any non-2xx status.
    pub async fn get(&self, path: &str, params: &Params) -> Result<Value, InstagramError> {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: self.build_url(path, params)?,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: Vec::new(),
        };
        tracing::debug!(path = %strip_query(path), "Graph API GET");
        self.execute(request).await
    }

    /// Authenticated form POST. Fails on any non-2xx status.
    pub async fn post(&self, path: &str, form: &Params) -> Result<Value, InstagramError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.build_url(path, &[])?,
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                (
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                ),
            ],
            body: body.into_bytes(),
        };
        tracing::debug!(path = %strip_query(path), "Graph API POST");
        self.execute(request).await
    }

    async fn execute(&self, request: HttpRequest) -> Result<Value, InstagramError> {
        let response: HttpResponse = self
            .transport
            .send(request)
            .await
            .map_err(|e| InstagramError::Http(e.to_string()))?;

        if !response.is_success() {
            let message = error_message_from_body(&response.body);
            tracing::debug!(status = response.status, message = %message, "Graph API error");
            return Err(InstagramError::Api {
                status: response.status,
                message,
            });
        }

        serde_json::from_slice(&response.body).map_err(InstagramError::Json)
    }
}

/// Drop the query string so access tokens never reach the logs.
fn strip_query(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

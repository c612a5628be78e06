//! Microsoft Graph HTTP client: request plumbing, status mapping and
//! `@odata.nextLink` pagination.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

use super::models::{GraphErrorBody, ODataPage};
use crate::auth::BearerToken;
use crate::config::Config;
use crate::error::ApiError;

/// Correlation header understood by Graph.
const CLIENT_REQUEST_ID: &str = "client-request-id";

/// Microsoft Graph API client.
pub struct GraphClient {
    http_client: Client,
    base_url: Url,
}

impl GraphClient {
    /// Create a new Graph client.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http_client = Client::builder()
            .timeout(config.http.timeout())
            .connect_timeout(config.http.connect_timeout())
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let base_url = Url::parse(&config.api.graph_base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.api.graph_base_url, e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Build `<base>/<segment>/<segment>...`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build an endpoint URL with a raw OData query string.
    pub fn endpoint_with_query(&self, segments: &[&str], query: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(segments)?;
        let query = query.trim_start_matches('?');
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: &BearerToken) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, token.as_header_value())
            .header(CLIENT_REQUEST_ID, Uuid::new_v4().to_string())
    }

    /// Issue a single GET and return the JSON body.
    pub async fn get_json(&self, url: Url, token: &BearerToken) -> Result<Value, ApiError> {
        debug!("GET {}", url);

        let response = self
            .request(Method::GET, url.clone(), token)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        info!("GET {} -> {}", url.path(), response.status());

        let response = ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::ParseFailed(e.to_string()))
    }

    /// GET a collection and follow `@odata.nextLink` until the last page.
    pub async fn get_all_pages(
        &self,
        url: Url,
        token: &BearerToken,
    ) -> Result<Vec<Value>, ApiError> {
        let mut records = Vec::new();
        let mut next = Some(url);
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let body = self.get_json(url, token).await?;
            let page: ODataPage =
                serde_json::from_value(body).map_err(|e| ApiError::ParseFailed(e.to_string()))?;

            pages += 1;
            records.extend(page.value);

            if let Some(link) = page.next_link {
                let link = Url::parse(&link)
                    .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", link, e)))?;
                next = Some(link);
            }
        }

        info!("Fetched {} records across {} page(s)", records.len(), pages);
        Ok(records)
    }

    /// Send a JSON body with the given method.
    ///
    /// Returns `None` when Graph answers without content (e.g. 204).
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        token: &BearerToken,
        body: &B,
    ) -> Result<Option<Value>, ApiError> {
        debug!("{} {}", method, url);

        let response = self
            .request(method.clone(), url.clone(), token)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        info!("{} {} -> {}", method, url.path(), status);

        let response = ensure_success(response).await?;
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::ParseFailed(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ApiError::ParseFailed(e.to_string()))
    }
}

/// Map non-success statuses to typed errors.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("Graph request failed: HTTP {} - {}", status, body);

    match status.as_u16() {
        400 => Err(ApiError::BadRequest(graph_error_message(&body))),
        401 => Err(ApiError::Unauthorized),
        403 => Err(ApiError::Forbidden),
        404 => Err(ApiError::NotFound),
        429 => Err(ApiError::RateLimited),
        code => Err(ApiError::RequestFailed(format!("HTTP {}", code))),
    }
}

/// Pull `error.message` out of a Graph error body.
fn graph_error_message(body: &str) -> String {
    serde_json::from_str::<GraphErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| "HTTP 400".to_string())
}

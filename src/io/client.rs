//! Typed client for the survey backend's JSON endpoints.

use anyhow::{Context, Result};
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{
    Client, Method, RequestBuilder,
    header::{ACCEPT, HeaderMap, HeaderValue},
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    AuditEntry, Household, HouseholdPayload, InfrastructureItem, LookupOption, RegionLevel,
    SubmissionStatus,
};

use super::{
    ApiError, ClientConfig, HouseholdStore, RegionSource, SaveReceipt, classify_failure,
    household_from_value,
};

pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Success body: a message next to the flattened payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub payload: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.meta.current_page < self.meta.last_page
    }
}

/// Filters for the household listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubmissionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub village_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn status(mut self, status: SubmissionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn village(mut self, village_id: impl Into<String>) -> Self {
        self.village_id = Some(village_id.into());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }
}

/// A photo attached to a household.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Joins percent-encoded path segments onto the base URL.
    pub fn url(&self, segments: &[&str]) -> String {
        let mut url = self.config.base_url.trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.extend(utf8_percent_encode(segment, PATH_SEGMENT));
        }
        url
    }

    pub async fn household(&self, id: &str) -> Result<Household, ApiError> {
        let value: Value = self
            .execute(self.request(Method::GET, &["households", id]))
            .await?;
        household_from_value(value)
            .map(|document| document.into_household(id))
            .map_err(|err| ApiError::Decode(format!("{err:#}")))
    }

    pub async fn update_household(
        &self,
        id: &str,
        payload: &HouseholdPayload,
    ) -> Result<SaveReceipt, ApiError> {
        self.execute(self.update_request(&["households", id]).json(payload))
            .await
    }

    pub async fn delete_household(&self, id: &str) -> Result<SaveReceipt, ApiError> {
        self.execute(self.request(Method::DELETE, &["households", id]))
            .await
    }

    pub async fn upload_photo(
        &self,
        id: &str,
        photo: PhotoUpload,
    ) -> Result<SaveReceipt, ApiError> {
        let part = Part::bytes(photo.bytes)
            .file_name(photo.file_name)
            .mime_str(&photo.mime)?;
        let mut form = Form::new().part("photo", part);
        if let Some(caption) = photo.caption {
            form = form.text("caption", caption);
        }
        self.execute(
            self.request(Method::POST, &["households", id, "photos"])
                .multipart(form),
        )
        .await
    }

    pub async fn approve(&self, id: &str) -> Result<SaveReceipt, ApiError> {
        self.execute(self.request(Method::POST, &["households", id, "approve"]))
            .await
    }

    /// A rejection must carry a reason; a blank one is refused locally.
    pub async fn reject(&self, id: &str, reason: &str) -> Result<SaveReceipt, ApiError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApiError::Validation {
                message: "A rejection reason is required.".to_string(),
                errors: [("reason".to_string(), vec!["The reason field is required.".to_string()])]
                    .into_iter()
                    .collect(),
            });
        }
        self.execute(
            self.request(Method::POST, &["households", id, "reject"])
                .json(&serde_json::json!({ "reason": reason })),
        )
        .await
    }

    pub async fn list_households(&self, query: &ListQuery) -> Result<Page<Household>, ApiError> {
        self.execute(self.request(Method::GET, &["households"]).query(query))
            .await
    }

    pub async fn audit_log(&self, id: &str) -> Result<Vec<AuditEntry>, ApiError> {
        let page: Page<AuditEntry> = self
            .execute(self.request(Method::GET, &["households", id, "audits"]))
            .await?;
        Ok(page.data)
    }

    pub async fn infrastructure_items(
        &self,
        village_id: Option<&str>,
    ) -> Result<Vec<InfrastructureItem>, ApiError> {
        let mut request = self.request(Method::GET, &["infrastructure-items"]);
        if let Some(village_id) = village_id {
            request = request.query(&[("village_id", village_id)]);
        }
        let page: Page<InfrastructureItem> = self.execute(request).await?;
        Ok(page.data)
    }

    pub async fn create_infrastructure_item(
        &self,
        item: &InfrastructureItem,
    ) -> Result<ApiResponse<InfrastructureItem>, ApiError> {
        self.execute(
            self.request(Method::POST, &["infrastructure-items"])
                .json(item),
        )
        .await
    }

    pub async fn update_infrastructure_item(
        &self,
        id: &str,
        item: &InfrastructureItem,
    ) -> Result<ApiResponse<InfrastructureItem>, ApiError> {
        self.execute(self.update_request(&["infrastructure-items", id]).json(item))
            .await
    }

    pub async fn delete_infrastructure_item(&self, id: &str) -> Result<SaveReceipt, ApiError> {
        self.execute(self.request(Method::DELETE, &["infrastructure-items", id]))
            .await
    }

    pub async fn regions(
        &self,
        level: RegionLevel,
        parent_id: Option<&str>,
    ) -> Result<Vec<LookupOption>, ApiError> {
        let mut request = self.request(Method::GET, &["regions", level.slug()]);
        if let Some(parent_id) = parent_id {
            request = request.query(&[("parent", parent_id)]);
        }
        self.execute(request).await
    }

    /// Mutating requests carry the CSRF token.
    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let mutating = method != Method::GET;
        let mut request = self.http.request(method, self.url(segments));
        if mutating && let Some(token) = self.config.csrf_token.as_deref() {
            request = request.header(CSRF_HEADER, token);
        }
        request
    }

    fn update_request(&self, segments: &[&str]) -> RequestBuilder {
        if self.config.spoof_methods {
            self.request(Method::POST, segments)
                .header(METHOD_OVERRIDE_HEADER, "PUT")
        } else {
            self.request(Method::PUT, segments)
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;
        if !status.is_success() {
            let err = classify_failure(status.as_u16(), &body);
            warn!(status = status.as_u16(), %url, error = %err, "request rejected");
            return Err(err);
        }
        debug!(status = status.as_u16(), %url, "request succeeded");
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl HouseholdStore for ApiClient {
    async fn load_household(&self, id: &str) -> Result<Household, ApiError> {
        self.household(id).await
    }

    async fn save_household(
        &self,
        id: &str,
        payload: &HouseholdPayload,
    ) -> Result<SaveReceipt, ApiError> {
        self.update_household(id, payload).await
    }
}

#[async_trait]
impl RegionSource for ApiClient {
    async fn fetch_regions(
        &self,
        level: RegionLevel,
        parent_id: Option<&str>,
    ) -> Result<Vec<LookupOption>, ApiError> {
        self.regions(level, parent_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(config: ClientConfig) -> ApiClient {
        ApiClient::new(config).unwrap()
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let api = client(ClientConfig::new("https://survey.example/api/"));
        assert_eq!(
            api.url(&["households", "a b/../c"]),
            "https://survey.example/api/households/a%20b%2F..%2Fc"
        );
    }

    #[test]
    fn csrf_token_only_on_mutating_requests() {
        let api = client(ClientConfig::new("http://localhost").with_csrf_token("tok-1"));
        let get = api.request(Method::GET, &["households", "1"]).build().unwrap();
        assert!(get.headers().get(CSRF_HEADER).is_none());
        let post = api
            .request(Method::POST, &["households", "1", "approve"])
            .build()
            .unwrap();
        assert_eq!(post.headers()[CSRF_HEADER], "tok-1");
    }

    #[test]
    fn spoofed_update_uses_post_with_override_header() {
        let api = client(
            ClientConfig::new("http://localhost")
                .with_csrf_token("tok")
                .with_spoofed_methods(true),
        );
        let request = api.update_request(&["households", "9"]).build().unwrap();
        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.headers()[METHOD_OVERRIDE_HEADER], "PUT");
        assert_eq!(request.headers()[CSRF_HEADER], "tok");

        let plain = client(ClientConfig::new("http://localhost"));
        let request = plain.update_request(&["households", "9"]).build().unwrap();
        assert_eq!(*request.method(), Method::PUT);
    }

    #[test]
    fn list_query_skips_unset_filters() {
        let api = client(ClientConfig::new("http://localhost"));
        let query = ListQuery::default()
            .page(2)
            .status(SubmissionStatus::Submitted);
        let request = api
            .request(Method::GET, &["households"])
            .query(&query)
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("page=2&status=submitted"));
    }

    #[test]
    fn paged_body_deserializes() {
        let page: Page<Household> = serde_json::from_value(json!({
            "data": [{"id": "1", "status": "approved", "general": {"headName": "Budi"}}],
            "meta": {"current_page": 1, "last_page": 3, "per_page": 15, "total": 31}
        }))
        .unwrap();
        assert!(page.has_more());
        assert_eq!(page.data[0].status, SubmissionStatus::Approved);
    }

    #[tokio::test]
    async fn blank_rejection_reason_is_refused_locally() {
        let api = client(ClientConfig::new("http://127.0.0.1:9"));
        let err = api.reject("1", "   ").await.unwrap_err();
        assert_eq!(err.first_field_error(), Some(("reason", "The reason field is required.")));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let api = client(
            ClientConfig::new("http://127.0.0.1:9").with_timeout(std::time::Duration::from_secs(2)),
        );
        let err = api.household("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    }
}

//! HTTP client for the XS2 ticket-inventory API.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::utils::error::AppError;

/// Query parameters, kept sorted so the same query always serializes the
/// same way.
pub type Params = BTreeMap<String, String>;

#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// GETs `path` relative to the API root. A non-2xx answer comes back as
    /// [`AppError::Upstream`] carrying the upstream status and body.
    async fn get_json(&self, path: &str, params: &Params) -> Result<Value, AppError>;
}

#[derive(Clone)]
pub struct Xs2Client {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl Xs2Client {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl InventoryApi for Xs2Client {
    async fn get_json(&self, path: &str, params: &Params) -> Result<Value, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("XS2_API_KEY is not configured".into()))?;

        let url = self.url(path);
        tracing::debug!(%url, ?params, "Inventory request");

        // Responses are cached by the proxy; the HTTP layer must not cache too.
        let response = self
            .http
            .get(&url)
            .query(params)
            .header("X-Api-Key", api_key)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Inventory request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Inventory response unreadable: {e}")))?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: status.as_u16(),
                details: body,
            });
        }

        Ok(body)
    }
}

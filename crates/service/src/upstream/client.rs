use std::time::Duration;

use configs::UpstreamConfig;
use models::EntityId;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::body::{error_message, extract_entity, extract_items, normalize_mutation_body};
use super::form::OutboundForm;
use super::resource::Resource;
use crate::errors::ProxyError;
use crate::observability::{UPSTREAM_DURATION, UPSTREAM_ERRORS_TOTAL, UPSTREAM_REQUESTS_TOTAL};

/// Thin typed client over the remote backend.
///
/// One `reqwest::Client` is shared by every handler; calls are never
/// retried. Reads are sent with caching disabled so admin lists always
/// reflect the latest writes.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http: reqwest::Client,
    api_base: String,
    asset_origin: String,
}

impl UpstreamClient {
    pub fn new(
        api_base: impl Into<String>,
        asset_origin: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ProxyError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProxyError::Network(e.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            asset_origin: asset_origin.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &UpstreamConfig) -> Result<Self, ProxyError> {
        Self::new(
            format!("{}{}", cfg.base_url, cfg.api_prefix),
            cfg.effective_asset_origin(),
            Duration::from_secs(cfg.connect_timeout_secs),
            Duration::from_secs(cfg.request_timeout_secs),
        )
    }

    pub fn asset_origin(&self) -> &str { &self.asset_origin }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn get_json(
        &self,
        label: &str,
        path: &str,
        token: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let req = self
            .http
            .get(self.url(path))
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache");
        let bytes = self.send(Method::GET, label, req, token).await?;
        serde_json::from_slice(&bytes).map_err(|e| ProxyError::Decode(e.to_string()))
    }

    #[instrument(skip(self, token), fields(resource = %resource))]
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        token: Option<&str>,
    ) -> Result<Vec<T>, ProxyError> {
        let value = self.get_json(resource.name(), &resource.collection_path(), token).await?;
        let items: Vec<T> = extract_items(value)?;
        debug!(count = items.len(), "upstream_list_fetched");
        Ok(items)
    }

    #[instrument(skip(self, token), fields(resource = %resource))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: EntityId,
        token: Option<&str>,
    ) -> Result<T, ProxyError> {
        let value = self.get_json(resource.name(), &resource.item_path(id), token).await?;
        extract_entity(value)
    }

    #[instrument(skip(self, form, token), fields(resource = %resource, has_file = form.has_file()))]
    pub async fn create(
        &self,
        resource: Resource,
        form: OutboundForm,
        token: Option<&str>,
    ) -> Result<Value, ProxyError> {
        self.send_form(Method::POST, resource, resource.collection_path(), form, token).await
    }

    #[instrument(skip(self, form, token), fields(resource = %resource, has_file = form.has_file()))]
    pub async fn update(
        &self,
        resource: Resource,
        id: EntityId,
        form: OutboundForm,
        token: Option<&str>,
    ) -> Result<Value, ProxyError> {
        self.send_form(Method::PUT, resource, resource.item_path(id), form, token).await
    }

    async fn send_form(
        &self,
        method: Method,
        resource: Resource,
        path: String,
        form: OutboundForm,
        token: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let body = form.into_multipart()?;
        let req = self.http.request(method.clone(), self.url(&path)).multipart(body);
        let bytes = self.send(method, resource.name(), req, token).await?;
        Ok(normalize_mutation_body(&bytes))
    }

    /// Deleting always needs credentials; without a token nothing is sent.
    #[instrument(skip(self, token), fields(resource = %resource))]
    pub async fn delete(
        &self,
        resource: Resource,
        id: EntityId,
        token: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let token = match token.filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => {
                warn!(event = "delete_rejected", "no bearer token");
                return Err(ProxyError::MissingCredentials);
            }
        };
        let req = self.http.delete(self.url(&resource.item_path(id)));
        let bytes = self.send(Method::DELETE, resource.name(), req, Some(token)).await?;
        Ok(normalize_mutation_body(&bytes))
    }

    #[instrument(skip(self, body, token))]
    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let req = self.http.post(self.url(path)).json(body);
        let bytes = self.send(Method::POST, path, req, token).await?;
        Ok(normalize_mutation_body(&bytes))
    }

    async fn send(
        &self,
        method: Method,
        label: &str,
        req: RequestBuilder,
        token: Option<&str>,
    ) -> Result<Vec<u8>, ProxyError> {
        UPSTREAM_REQUESTS_TOTAL.with_label_values(&[method.as_str(), label]).inc();
        let timer = UPSTREAM_DURATION.with_label_values(&[method.as_str()]).start_timer();
        let result = self.execute(req, token).await;
        timer.observe_duration();
        if let Err(e) = &result {
            UPSTREAM_ERRORS_TOTAL.with_label_values(&[label, e.kind()]).inc();
            warn!(
                method = %method,
                resource = label,
                kind = e.kind(),
                error = %e,
                "upstream_call_failed"
            );
        }
        result
    }

    async fn execute(
        &self,
        req: RequestBuilder,
        token: Option<&str>,
    ) -> Result<Vec<u8>, ProxyError> {
        let token = token.filter(|t| !t.is_empty());
        let req = match token {
            Some(t) => req.bearer_auth(t),
            None => req,
        };
        let resp = req.send().await.map_err(|e| ProxyError::Network(e.to_string()))?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| ProxyError::Network(e.to_string()))?;
        if status.is_success() {
            return Ok(bytes.to_vec());
        }
        if status.as_u16() == 401 {
            // 未携带 token 时 401 只代表缺少凭证
            return Err(if token.is_some() {
                ProxyError::SessionExpired
            } else {
                ProxyError::MissingCredentials
            });
        }
        Err(ProxyError::upstream(status.as_u16(), error_message(status.as_u16(), &bytes)))
    }
}

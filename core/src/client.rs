//! Stateless HTTP request builder and response parser for the roster API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Requests are produced by `build_get` / `build_post` and responses
//! consumed by `parse_json`; `get` / `post` glue the two together around a
//! [`Transport`]. Any status in 200..=299 counts as success.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Result, RosterError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a GET for `path`, appending `params` as a form-encoded query.
    pub fn build_get(&self, path: &str, params: &[(&str, &str)]) -> Result<HttpRequest> {
        let mut url = self.url_for(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        debug!(%url, "built GET");
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        })
    }

    pub fn build_post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<HttpRequest> {
        let url = self.url_for(path)?;
        let body =
            serde_json::to_string(body).map_err(|e| RosterError::Serialization(e.to_string()))?;
        debug!(%url, "built POST");
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn parse_json<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T> {
        check_status(&response)?;
        serde_json::from_str(&response.body)
            .map_err(|e| RosterError::Deserialization(e.to_string()))
    }

    pub fn get<T, X>(&self, transport: &X, path: &str, params: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
        X: Transport + ?Sized,
    {
        let request = self.build_get(path, params)?;
        self.parse_json(transport.execute(request)?)
    }

    pub fn post<T, B, X>(&self, transport: &X, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
        X: Transport + ?Sized,
    {
        let request = self.build_post(path, body)?;
        self.parse_json(transport.execute(request)?)
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{path}", self.base_url);
        Url::parse(&raw).map_err(|e| RosterError::InvalidUrl(format!("{raw}: {e}")))
    }
}

/// Map non-success status codes to `RosterError::Http`.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(RosterError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

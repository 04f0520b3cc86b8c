//! HTTP API client for the storefront backend.
//!
//! Thin transport collaborator: joins paths onto a base URL, carries
//! ambient credentials (a cookie store for the backend's JWT cookie, plus
//! an optional bearer key), and maps non-2xx responses to typed errors.
//! The query layer treats it as opaque; every fetcher and mutation
//! request bottoms out here.

use bytes::Bytes;
use reqwest::{Client, Method, Response, Url, multipart};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiSettings;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("base URL is required (set api.base_url or VETRINA_API__BASE_URL)")]
    MissingBaseUrl,
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server error: status {status} body {body}")]
    Server { status: u16, body: String },
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Client over the storefront REST API.
///
/// Cheap to clone; clones share the connection pool and cookie store, so
/// a login on one clone authenticates them all.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::build(base_url, None, None)
    }

    pub fn from_settings(settings: &ApiSettings) -> Result<Self, ClientError> {
        if settings.base_url.is_empty() {
            return Err(ClientError::MissingBaseUrl);
        }
        Self::build(
            &settings.base_url,
            settings.api_key.clone(),
            Some(std::time::Duration::from_millis(settings.timeout_ms)),
        )
    }

    fn build(
        base_url: &str,
        api_key: Option<String>,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?.join("/")?;
        let mut builder = Client::builder()
            .user_agent(Self::user_agent())
            .cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base,
            api_key,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("vetrina/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path.trim_start_matches('/')).map_err(ClientError::Url)
    }

    pub async fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.request(Method::GET, path, None, None::<&Value>).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ClientError> {
        self.request(Method::GET, path, Some(query), None::<&Value>)
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ClientError> {
        self.request(Method::POST, path, None, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ClientError> {
        self.request(Method::PUT, path, None, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        self.request(Method::DELETE, path, None, None::<&Value>)
            .await
    }

    /// Upload one file as a `multipart/form-data` body under the `file`
    /// field, the shape the backend's upload endpoint expects.
    pub async fn post_multipart(
        &self,
        path: &str,
        filename: &str,
        bytes: Bytes,
    ) -> Result<Value, ClientError> {
        if filename.is_empty() {
            return Err(ClientError::InvalidInput(
                "upload filename must not be empty".to_string(),
            ));
        }
        let url = self.url(path)?;
        let part = multipart::Part::stream(bytes).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);

        let mut req = self.client.post(url).multipart(form);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        Self::handle(req.send().await?).await
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&B>,
    ) -> Result<Value, ClientError> {
        let mut url = self.url(path)?;
        if let Some(pairs) = query {
            url.set_query(None);
            let mut qp = url.query_pairs_mut();
            for (k, v) in pairs {
                qp.append_pair(k, v);
            }
        }
        debug!(method = %method, url = %url, "API request");

        let mut req = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        Self::handle(req.send().await?).await
    }

    async fn handle(resp: Response) -> Result<Value, ClientError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

//! Paperless API client.
//!
//! Every request carries the headers from a [`ServiceContext`] that is built
//! once per invocation and owned by the client; nothing is shared between
//! invocations.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::paperless::types::{DocumentUpload, RemoteTag, ServiceResponse, TagList};

const CF_ACCESS_CLIENT_ID: HeaderName = HeaderName::from_static("cf-access-client-id");
const CF_ACCESS_CLIENT_SECRET: HeaderName = HeaderName::from_static("cf-access-client-secret");

/// The document-management operations the pipeline needs.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// List all tags. Non-success statuses are errors.
    async fn list_tags(&self) -> Result<Vec<RemoteTag>, ServiceError>;

    /// Upload one document. Any HTTP response is `Ok`; only transport and
    /// encoding failures are errors.
    async fn post_document(&self, upload: DocumentUpload) -> Result<ServiceResponse, ServiceError>;
}

/// Base URL and auth headers for one invocation.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    base_url: String,
    headers: HeaderMap,
}

impl ServiceContext {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            sensitive_header(
                "Authorization",
                &format!("Token {}", config.token.expose_secret()),
            )?,
        );
        if let Some(id) = &config.access_client_id {
            headers.insert(CF_ACCESS_CLIENT_ID, sensitive_header("CF-Access-Client-Id", id)?);
        }
        if let Some(secret) = &config.access_client_secret {
            headers.insert(
                CF_ACCESS_CLIENT_SECRET,
                sensitive_header("CF-Access-Client-Secret", secret.expose_secret())?,
            );
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    /// Join an endpoint path (without leading slash) onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

fn sensitive_header(name: &'static str, value: &str) -> Result<HeaderValue, ServiceError> {
    let mut value = HeaderValue::from_str(value).map_err(|e| ServiceError::InvalidHeader {
        name,
        reason: e.to_string(),
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// HTTP client for the Paperless REST API.
pub struct PaperlessClient {
    context: ServiceContext,
    client: reqwest::Client,
}

impl PaperlessClient {
    pub fn new(context: ServiceContext) -> Self {
        Self {
            context,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DocumentService for PaperlessClient {
    async fn list_tags(&self) -> Result<Vec<RemoteTag>, ServiceError> {
        let resp = self
            .client
            .get(self.context.url("tags/"))
            .headers(self.context.headers.clone())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }

        let list: TagList = resp.json().await?;
        Ok(list.results)
    }

    async fn post_document(&self, upload: DocumentUpload) -> Result<ServiceResponse, ServiceError> {
        let form = upload.into_form()?;
        let resp = self
            .client
            .post(self.context.url("documents/post_document/"))
            .headers(self.context.headers.clone())
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Ok(ServiceResponse { status, body })
    }
}

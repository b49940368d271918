//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

use crate::InventoryError;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a transport error, keeping the body for the log
    pub fn error_for_status(self, what: &str) -> crate::Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(InventoryError::Transport(format!(
                "{} returned status {}: {}",
                what, self.status, self.body
            )))
        }
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// Send a POST request with a raw body
    async fn post_body(&self, url: &str, body: String) -> crate::Result<HttpResponse>;

    /// Send a DELETE request
    async fn delete(&self, url: &str) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn with_timeout(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InventoryError::Config(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn finish(
        method: &str,
        url: &str,
        sent: std::result::Result<reqwest::Response, reqwest::Error>,
    ) -> crate::Result<HttpResponse> {
        let response = sent.map_err(|e| {
            InventoryError::Transport(format!("{} {} failed: {}", method, url, e))
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| InventoryError::Transport(format!("Reading response body: {}", e)))?;

        tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let sent = self.client.get(url).send().await;
        Self::finish("GET", url, sent).await
    }

    async fn post_body(&self, url: &str, body: String) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {} ({} bytes)", url, body.len());
        let sent = self.client.post(url).body(body).send().await;
        Self::finish("POST", url, sent).await
    }

    async fn delete(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("DELETE {}", url);
        let sent = self.client.delete(url).send().await;
        Self::finish("DELETE", url, sent).await
    }
}

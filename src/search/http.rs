//! HTTP backend abstraction
//!
//! The API clients talk to the network through [`HttpBackend`] so they can
//! be exercised against canned responses. The production implementation
//! wraps a shared `reqwest::Client`.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::error::{Result, ShelfmarkError};

/// Minimal HTTP operations the API clients need
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// GET a JSON endpoint and return the response body
    async fn get_json(&self, url: &Url, timeout: Duration) -> Result<String>;

    /// POST a JSON body and return the response body
    async fn post_json(
        &self,
        url: &Url,
        bearer: Option<&str>,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<String>;
}

/// Production backend using reqwest
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a new backend sending `user_agent` with every request
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    async fn read_body(response: reqwest::Response, url: &Url) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(ShelfmarkError::network(format!(
                "{} returned {}",
                redact(url),
                status
            )));
        }
        response
            .text()
            .await
            .map_err(|e| ShelfmarkError::network(e.to_string()))
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json(&self, url: &Url, timeout: Duration) -> Result<String> {
        tracing::debug!("GET {}", redact(url));

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ShelfmarkError::network(format!("{}: {}", redact(url), e.without_url())))?;

        Self::read_body(response, url).await
    }

    async fn post_json(
        &self,
        url: &Url,
        bearer: Option<&str>,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<String> {
        tracing::debug!("POST {}", redact(url));

        let mut request = self.client.post(url.clone()).json(body).timeout(timeout);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ShelfmarkError::network(format!("{}: {}", redact(url), e.without_url())))?;

        Self::read_body(response, url).await
    }
}

/// Render a URL without its query string, which carries API keys
pub fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_strips_query() {
        let url =
            Url::parse("http://data4library.kr/api/srchBooks?authKey=secret&keyword=a").unwrap();
        assert_eq!(redact(&url), "http://data4library.kr/api/srchBooks");
    }

    #[test]
    fn test_backend_user_agent() {
        let default_agent = crate::config::NetworkConfig::default().user_agent;
        assert!(ReqwestBackend::new(&default_agent).is_ok());
        assert!(ReqwestBackend::new("shelf-bot/2.0").is_ok());
        assert!(matches!(
            ReqwestBackend::new("bad\nagent"),
            Err(ShelfmarkError::Http(_))
        ));
    }
}

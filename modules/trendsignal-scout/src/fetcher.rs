// SourceFetcher: one retrieval against one external endpoint.
//
// Every trend and context source goes through this trait, so tests swap in
// MockFetcher and never touch the network. No retries here; fallback policy
// lives in the callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use tracing::debug;

use trendsignal_common::FetchError;

/// Error bodies are kept for logging only; cap what we hold on to.
const MAX_ERROR_BODY_BYTES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// What to fetch: method, URL, query, headers, optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            json: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            json: Some(body),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// URL with the query string applied, percent-encoded.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        match url::Url::parse_with_params(&self.url, &self.query) {
            Ok(u) => u.to_string(),
            Err(_) => self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Perform the request. Non-2xx statuses come back as `FetchError::HttpStatus`.
    async fn fetch(&self, spec: &RequestSpec) -> Result<RawResponse, FetchError>;
}

// --- reqwest-backed fetcher ---

pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    fn classify(url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, spec: &RequestSpec) -> Result<RawResponse, FetchError> {
        let mut request = match spec.method {
            Method::Get => self.client.get(&spec.url),
            Method::Post => self.client.post(&spec.url),
        };
        request = request.header(USER_AGENT, &self.user_agent);
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        for (key, value) in &spec.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(ref body) = spec.json {
            request = request.json(body);
        }

        debug!(url = %spec.url, method = ?spec.method, "Fetching");

        let resp = request
            .send()
            .await
            .map_err(|e| Self::classify(&spec.url, e))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| Self::classify(&spec.url, e))?;

        if !(200..300).contains(&status) {
            let body = ai_client::truncate_to_char_boundary(&body, MAX_ERROR_BODY_BYTES).to_string();
            return Err(FetchError::HttpStatus {
                url: spec.url.clone(),
                status,
                body,
            });
        }

        debug!(url = %spec.url, status, bytes = body.len(), "Fetched");
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5), "Mozilla/5.0 test").unwrap()
    }

    #[test]
    fn full_url_encodes_query() {
        let spec = RequestSpec::get("https://www.google.com/search")
            .query("q", "인공지능")
            .query("tbm", "nws");
        let url = spec.full_url();
        assert!(url.starts_with("https://www.google.com/search?q=%EC%9D%B8"));
        assert!(url.ends_with("&tbm=nws"));
    }

    #[tokio::test]
    async fn sends_user_agent_headers_and_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_header("user-agent", "Mozilla/5.0 test")
            .match_header("x-naver-client-id", "id")
            .match_query(Matcher::UrlEncoded("q".into(), "부동산".into()))
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let spec = RequestSpec::get(format!("{}/search", server.url()))
            .query("q", "부동산")
            .header("X-Naver-Client-Id", "id");
        let resp = fetcher().fetch(&spec).await.unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "<html></html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn posts_json_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/datalab")
            .match_body(Matcher::Json(serde_json::json!({"timeUnit": "date"})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let spec = RequestSpec::post_json(
            format!("{}/datalab", server.url()),
            serde_json::json!({"timeUnit": "date"}),
        );
        fetcher().fetch(&spec).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_typed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/blocked")
            .with_status(429)
            .with_body("Too Many Requests")
            .create_async()
            .await;

        let spec = RequestSpec::get(format!("{}/blocked", server.url()));
        match fetcher().fetch(&spec).await {
            Err(FetchError::HttpStatus { status, body, .. }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "Too Many Requests");
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let spec = RequestSpec::get("http://127.0.0.1:9/");
        let err = fetcher().fetch(&spec).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Network { .. } | FetchError::Timeout { .. }
        ));
    }
}

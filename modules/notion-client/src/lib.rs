pub mod error;
pub mod types;

pub use error::{NotionError, Result};
pub use types::{
    rich_text, Block, CreatePageRequest, Page, Properties, PropertyValue, RichText,
    MAX_TEXT_CHARS,
};

use std::time::Duration;

use types::ApiErrorBody;

const BASE_URL: &str = "https://api.notion.com/v1";

/// Pinned API version sent on every request.
const NOTION_VERSION: &str = "2022-06-28";

pub struct NotionClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl NotionClient {
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotionError::Network(e.to_string()))?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Create a page (a database row) under the request's parent database.
    pub async fn create_page(&self, request: &CreatePageRequest) -> Result<Page> {
        let url = format!("{}/pages", self.base_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) if !err.message.is_empty() => format!("{}: {}", err.code, err.message),
                _ => body,
            };
            tracing::debug!(status = status.as_u16(), %message, "Notion create page rejected");
            return Err(NotionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let page: Page = serde_json::from_str(&body)?;
        Ok(page)
    }
}

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use trendsignal_common::settings::ContextSettings;
use trendsignal_common::{Credentials, ParseError, Snippet, SnippetOrigin, SourceError, Term};

use super::{ContextSource, SourceContext};
use crate::fetcher::{RequestSpec, SourceFetcher};

const SOURCE_NAME: &str = "naver_news";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// News search API authenticated with the same client pair as the trend API.
pub struct NaverNewsSource {
    fetcher: Arc<dyn SourceFetcher>,
    url: String,
    client_id: String,
    client_secret: String,
    limit: usize,
}

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    items: Vec<NewsItem>,
}

#[derive(Deserialize)]
struct NewsItem {
    title: String,
    #[serde(default)]
    description: String,
}

impl NaverNewsSource {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        credentials: &Credentials,
        settings: &ContextSettings,
    ) -> Self {
        Self {
            fetcher,
            url: settings.naver_news_url.clone(),
            client_id: credentials.naver_client_id.clone(),
            client_secret: credentials.naver_client_secret.clone(),
            limit: settings.naver_news_limit,
        }
    }
}

#[async_trait]
impl ContextSource for NaverNewsSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn collect(&self, term: &Term) -> Result<SourceContext, SourceError> {
        let spec = RequestSpec::get(&self.url)
            .query("query", term.as_str())
            .query("display", self.limit.to_string())
            .query("sort", "sim")
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret);
        let response = self.fetcher.fetch(&spec).await?;

        let parsed: NewsResponse =
            serde_json::from_str(&response.body).map_err(|e| ParseError::InvalidJson {
                source_name: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;

        let snippets = parsed
            .items
            .into_iter()
            .take(self.limit)
            .filter_map(|item| {
                let title = strip_markup(&item.title);
                if title.is_empty() {
                    return None;
                }
                Some(Snippet::new(SnippetOrigin::News, title).with_summary(strip_markup(&item.description)))
            })
            .collect();

        Ok(SourceContext {
            snippets,
            related_terms: Vec::new(),
        })
    }
}

/// Remove HTML tags and decode the handful of entities the API emits.
pub fn strip_markup(s: &str) -> String {
    let without_tags = TAG_RE.replace_all(s, "");
    let decoded = without_tags
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    const RESPONSE: &str = r#"{
        "lastBuildDate": "Mon, 03 Jun 2024 10:00:00 +0900",
        "total": 2, "start": 1, "display": 3,
        "items": [
            {"title": "<b>AI</b> 규제 &quot;강화&quot;", "originallink": "", "link": "", "description": "정부가 <b>AI</b> 법안을 &amp; 발표", "pubDate": ""},
            {"title": "<b></b>", "originallink": "", "link": "", "description": "", "pubDate": ""}
        ]
    }"#;

    fn credentials() -> Credentials {
        Credentials::from_lookup(|name| Some(format!("{name}-value"))).unwrap()
    }

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(strip_markup("<b>AI</b> &amp; 로봇 &lt;3"), "AI & 로봇 <3");
        assert_eq!(strip_markup("  <b> </b> "), "");
    }

    #[tokio::test]
    async fn parses_items_into_news_snippets() {
        let fetcher = Arc::new(MockFetcher::new().on("news.json", RESPONSE));
        let source = NaverNewsSource::new(fetcher.clone(), &credentials(), &ContextSettings::default());

        let found = source.collect(&Term::verbatim("AI")).await.unwrap();
        assert_eq!(found.snippets.len(), 1);
        assert_eq!(found.snippets[0].title, "AI 규제 \"강화\"");
        assert_eq!(found.snippets[0].summary.as_deref(), Some("정부가 AI 법안을 & 발표"));

        let request = &fetcher.requests()[0];
        assert!(request
            .headers
            .contains(&("X-Naver-Client-Secret".to_string(), "NAVER_CLIENT_SECRET-value".to_string())));
        assert!(request.query.contains(&("display".to_string(), "3".to_string())));
    }

    #[tokio::test]
    async fn non_json_body_is_parse_error() {
        let fetcher = Arc::new(MockFetcher::new().on("news.json", "<html>blocked</html>"));
        let source = NaverNewsSource::new(fetcher, &credentials(), &ContextSettings::default());
        assert!(matches!(
            source.collect(&Term::verbatim("AI")).await,
            Err(SourceError::Parse(ParseError::InvalidJson { .. }))
        ));
    }
}

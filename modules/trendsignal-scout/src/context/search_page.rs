use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use trendsignal_common::settings::ContextSettings;
use trendsignal_common::{ParseError, Snippet, SnippetOrigin, SourceError, Term};

use super::{ContextSource, SourceContext};
use crate::fetcher::{RequestSpec, SourceFetcher};
use crate::selectors::{CandidateExtractor, SelectorCascade};

const WEB_TITLE_SELECTORS: &[&str] = &["h3", "div[role='heading']"];
const NEWS_TITLE_SELECTORS: &[&str] = &["div.n0jPhd", "div[role='heading']", "h3"];
const RELATED_SELECTORS: &[&str] = &["div.s75CSd", "a.k8XOCe", "#bres a"];

/// Result titles scraped from a search engine page, web or news tab.
pub struct SearchPageSource {
    fetcher: Arc<dyn SourceFetcher>,
    name: &'static str,
    url: String,
    origin: SnippetOrigin,
    titles: SelectorCascade,
    related: Option<SelectorCascade>,
}

impl SearchPageSource {
    /// General web results, plus the "related searches" block when enabled.
    pub fn web(fetcher: Arc<dyn SourceFetcher>, settings: &ContextSettings) -> Result<Self, ParseError> {
        let related = if settings.related_terms {
            Some(SelectorCascade::new("related_searches", RELATED_SELECTORS)?)
        } else {
            None
        };
        Ok(Self {
            fetcher,
            name: "web_search",
            url: settings.web_search_url.clone(),
            origin: SnippetOrigin::WebSearch,
            titles: SelectorCascade::new("web_search", WEB_TITLE_SELECTORS)?
                .with_limit(settings.web_limit),
            related,
        })
    }

    /// News-tab results.
    pub fn news(fetcher: Arc<dyn SourceFetcher>, settings: &ContextSettings) -> Result<Self, ParseError> {
        Ok(Self {
            fetcher,
            name: "news_search",
            url: settings.news_search_url.clone(),
            origin: SnippetOrigin::News,
            titles: SelectorCascade::new("news_search", NEWS_TITLE_SELECTORS)?
                .with_limit(settings.news_limit),
            related: None,
        })
    }

    fn request(&self, term: &Term) -> RequestSpec {
        let spec = RequestSpec::get(&self.url).query("q", term.as_str());
        match self.origin {
            SnippetOrigin::News => spec.query("tbm", "nws"),
            _ => spec,
        }
    }
}

#[async_trait]
impl ContextSource for SearchPageSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn collect(&self, term: &Term) -> Result<SourceContext, SourceError> {
        let response = self.fetcher.fetch(&self.request(term)).await?;
        let snippets = self
            .titles
            .extract(&response.body)?
            .into_iter()
            .map(|title| Snippet::new(self.origin, title))
            .collect();

        // Related searches are optional page furniture.
        let related_terms = match self.related {
            Some(ref cascade) => cascade.extract(&response.body).unwrap_or_else(|e| {
                debug!(term = %term, error = %e, "No related searches on page");
                Vec::new()
            }),
            None => Vec::new(),
        };

        Ok(SourceContext {
            snippets,
            related_terms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{search_page, MockFetcher};

    fn settings() -> ContextSettings {
        ContextSettings::default()
    }

    #[tokio::test]
    async fn web_titles_are_limited() {
        let page = search_page(&["one", "two", "three", "four", "five", "six"]);
        let fetcher = Arc::new(MockFetcher::new().on("google.com/search", &page));
        let source = SearchPageSource::web(fetcher.clone(), &settings()).unwrap();

        let found = source.collect(&Term::verbatim("부동산 전망")).await.unwrap();
        assert_eq!(found.snippets.len(), 5);
        assert_eq!(found.snippets[0].origin, SnippetOrigin::WebSearch);
        assert!(found.related_terms.is_empty());

        let requests = fetcher.requests();
        assert_eq!(requests[0].query, vec![("q".to_string(), "부동산 전망".to_string())]);
    }

    #[tokio::test]
    async fn news_tab_uses_tbm_parameter() {
        let page = search_page(&["뉴스 1", "뉴스 2", "뉴스 3", "뉴스 4"]);
        let fetcher = Arc::new(MockFetcher::new().on("tbm=nws", &page));
        let source = SearchPageSource::news(fetcher, &settings()).unwrap();

        let found = source.collect(&Term::verbatim("AI")).await.unwrap();
        assert_eq!(found.snippets.len(), 3);
        assert!(found.snippets.iter().all(|s| s.origin == SnippetOrigin::News));
    }

    #[tokio::test]
    async fn related_searches_are_collected() {
        let page = r#"<html><body>
            <h3>AI news</h3>
            <div id="bres"><a href="/a">AI 반도체</a><a href="/b">AI 교육</a></div>
        </body></html>"#;
        let fetcher = Arc::new(MockFetcher::new().on("google.com", page));
        let source = SearchPageSource::web(fetcher, &settings()).unwrap();

        let found = source.collect(&Term::verbatim("AI")).await.unwrap();
        assert_eq!(found.related_terms, vec!["AI 반도체", "AI 교육"]);
    }

    #[tokio::test]
    async fn empty_results_page_is_parse_error() {
        let fetcher = Arc::new(MockFetcher::new().on("google.com", "<html></html>"));
        let source = SearchPageSource::web(fetcher, &settings()).unwrap();
        assert!(matches!(
            source.collect(&Term::verbatim("AI")).await,
            Err(SourceError::Parse(_))
        ));
    }
}

use std::sync::Arc;

use async_trait::async_trait;

use trendsignal_common::settings::TrendingPageSettings;
use trendsignal_common::{ParseError, SourceError};

use super::TrendSource;
use crate::fetcher::{RequestSpec, SourceFetcher};
use crate::selectors::{CandidateExtractor, SelectorCascade};

/// A public "trending searches" page scraped with an ordered selector cascade.
pub struct TrendingPageSource {
    fetcher: Arc<dyn SourceFetcher>,
    url: String,
    extractor: SelectorCascade,
}

impl TrendingPageSource {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        settings: &TrendingPageSettings,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            fetcher,
            url: settings.url.clone(),
            extractor: SelectorCascade::new("trending_page", &settings.selectors)?,
        })
    }
}

#[async_trait]
impl TrendSource for TrendingPageSource {
    fn name(&self) -> &str {
        self.extractor.name()
    }

    async fn candidates(&self) -> Result<Vec<String>, SourceError> {
        let response = self.fetcher.fetch(&RequestSpec::get(&self.url)).await?;
        Ok(self.extractor.extract(&response.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{DiscoveryOrigin, KeywordDiscovery};
    use crate::testing::MockFetcher;
    use trendsignal_common::settings::DiscoverySettings;

    const PAGE: &str = r#"<html><body>
        <div class="rank-layer">
          <span class="rank-text">1신지 문원 돌싱</span>
          <span class="rank-text">2 실시간 검색어</span>
          <span class="rank-text">3 NEW 아이폰 출시</span>
        </div></body></html>"#;

    #[tokio::test]
    async fn scrapes_first_matching_selector() {
        let fetcher = Arc::new(MockFetcher::new().on("signal.bz", PAGE));
        let source = TrendingPageSource::new(fetcher, &TrendingPageSettings::default()).unwrap();
        let found = source.candidates().await.unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], "1신지 문원 돌싱");
    }

    #[tokio::test]
    async fn page_without_matches_is_parse_error() {
        let fetcher = Arc::new(MockFetcher::new().on("signal.bz", "<html><body></body></html>"));
        let source = TrendingPageSource::new(fetcher, &TrendingPageSettings::default()).unwrap();
        assert!(matches!(
            source.candidates().await,
            Err(SourceError::Parse(ParseError::NoMatches { .. }))
        ));
    }

    #[tokio::test]
    async fn discovery_cleans_scraped_candidates() {
        let fetcher = Arc::new(MockFetcher::new().on("signal.bz", PAGE));
        let settings = DiscoverySettings::default();
        let page = TrendingPageSource::new(fetcher, &settings.trending_page).unwrap();
        let sources: Vec<Arc<dyn TrendSource>> = vec![Arc::new(page)];
        let discovery = KeywordDiscovery::new(sources, &settings);

        let found = discovery.discover().await;
        assert_eq!(found.origin, DiscoveryOrigin::Source("trending_page".into()));
        let texts: Vec<_> = found.terms.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["신지 문원 돌싱", "아이폰 출시"]);
    }
}

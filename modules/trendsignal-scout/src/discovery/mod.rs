// Keyword discovery: pick today's terms, or fall back to the configured list.
//
// Sources are tried in order. The first one that yields at least one usable
// term wins. Nothing here fails: the worst case is the fallback list.

mod datalab;
mod trending_page;

pub use datalab::DataLabSource;
pub use trending_page::TrendingPageSource;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use trendsignal_common::settings::DiscoverySettings;
use trendsignal_common::{SourceError, Term};

use crate::terms::TermRules;

#[async_trait]
pub trait TrendSource: Send + Sync {
    fn name(&self) -> &str;

    /// Candidates are operator-chosen and skip cleaning.
    fn curated(&self) -> bool {
        false
    }

    /// Raw candidates, best first.
    async fn candidates(&self) -> Result<Vec<String>, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOrigin {
    Source(String),
    Fallback,
    /// Terms supplied on the command line.
    Operator,
}

impl fmt::Display for DiscoveryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryOrigin::Source(name) => f.write_str(name),
            DiscoveryOrigin::Fallback => f.write_str("fallback"),
            DiscoveryOrigin::Operator => f.write_str("operator"),
        }
    }
}

/// The terms chosen for a run. Always 1..=max_terms long.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub terms: Vec<Term>,
    pub origin: DiscoveryOrigin,
}

pub struct KeywordDiscovery {
    sources: Vec<Arc<dyn TrendSource>>,
    rules: TermRules,
    fallback_terms: Vec<String>,
    max_terms: usize,
}

impl KeywordDiscovery {
    pub fn new(sources: Vec<Arc<dyn TrendSource>>, settings: &DiscoverySettings) -> Self {
        let fallback_terms = if settings.fallback_terms.iter().any(|t| !t.trim().is_empty()) {
            settings.fallback_terms.clone()
        } else {
            DiscoverySettings::default().fallback_terms
        };
        Self {
            sources,
            rules: TermRules::from_settings(settings),
            fallback_terms,
            max_terms: settings.max_terms.max(1),
        }
    }

    pub async fn discover(&self) -> Discovery {
        for source in &self.sources {
            let candidates = match source.candidates().await {
                Ok(c) => c,
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Trend source failed");
                    continue;
                }
            };
            let terms = if source.curated() {
                self.rules.select_curated(&candidates, self.max_terms)
            } else {
                self.rules.select(&candidates, self.max_terms)
            };
            if terms.is_empty() {
                warn!(
                    source = source.name(),
                    candidates = candidates.len(),
                    "Trend source yielded no usable terms"
                );
                continue;
            }
            info!(
                source = source.name(),
                terms = ?terms.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
                "Discovered terms"
            );
            return Discovery {
                terms,
                origin: DiscoveryOrigin::Source(source.name().to_string()),
            };
        }
        self.fallback()
    }

    /// Operator-configured terms: no cleaning, but near-duplicates still go.
    pub fn fallback(&self) -> Discovery {
        let terms = self.rules.select_curated(&self.fallback_terms, self.max_terms);
        info!(
            terms = ?terms.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            "Using fallback terms"
        );
        Discovery {
            terms,
            origin: DiscoveryOrigin::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendsignal_common::{FetchError, ParseError};

    struct FixedSource {
        name: &'static str,
        curated: bool,
        result: Result<Vec<String>, SourceError>,
    }

    impl FixedSource {
        fn ok(name: &'static str, items: &[&str]) -> Arc<dyn TrendSource> {
            Arc::new(Self {
                name,
                curated: false,
                result: Ok(items.iter().map(|s| s.to_string()).collect()),
            })
        }

        fn err(name: &'static str, error: SourceError) -> Arc<dyn TrendSource> {
            Arc::new(Self {
                name,
                curated: false,
                result: Err(error),
            })
        }
    }

    #[async_trait]
    impl TrendSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }
        fn curated(&self) -> bool {
            self.curated
        }
        async fn candidates(&self) -> Result<Vec<String>, SourceError> {
            self.result.clone()
        }
    }

    fn timeout() -> SourceError {
        SourceError::Fetch(FetchError::Timeout {
            url: "https://example.test".into(),
        })
    }

    #[tokio::test]
    async fn first_usable_source_wins() {
        let discovery = KeywordDiscovery::new(
            vec![
                FixedSource::ok("empty", &["1", "더보기"]),
                FixedSource::ok("page", &["1신지 문원 돌싱", "2부동산 전망"]),
                FixedSource::ok("never", &["unused term"]),
            ],
            &DiscoverySettings::default(),
        );
        let found = discovery.discover().await;
        assert_eq!(found.origin, DiscoveryOrigin::Source("page".into()));
        let texts: Vec<_> = found.terms.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["신지 문원 돌싱", "부동산 전망"]);
    }

    #[tokio::test]
    async fn all_sources_failing_uses_fallback() {
        let discovery = KeywordDiscovery::new(
            vec![
                FixedSource::err("api", timeout()),
                FixedSource::err(
                    "page",
                    SourceError::Parse(ParseError::NoMatches {
                        source_name: "page".into(),
                    }),
                ),
            ],
            &DiscoverySettings::default(),
        );
        let found = discovery.discover().await;
        assert_eq!(found.origin, DiscoveryOrigin::Fallback);
        let texts: Vec<_> = found.terms.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["인공지능", "투자", "부동산", "취업", "여행"]);
    }

    #[tokio::test]
    async fn no_sources_uses_fallback() {
        let discovery = KeywordDiscovery::new(Vec::new(), &DiscoverySettings::default());
        assert_eq!(discovery.discover().await.origin, DiscoveryOrigin::Fallback);
    }

    #[tokio::test]
    async fn terms_never_exceed_max() {
        let settings = DiscoverySettings {
            max_terms: 2,
            ..Default::default()
        };
        let discovery = KeywordDiscovery::new(
            vec![FixedSource::ok("page", &["alpha one", "beta two", "gamma three"])],
            &settings,
        );
        assert_eq!(discovery.discover().await.terms.len(), 2);
        assert_eq!(discovery.fallback().terms.len(), 2);
    }

    #[tokio::test]
    async fn fallback_drops_near_duplicates() {
        let settings = DiscoverySettings {
            fallback_terms: vec![
                "AI".into(),
                "AI 반도체".into(),
                " 투자 ".into(),
                "투자".into(),
                "부동산 시장 전망".into(),
                "주식 시장 전망".into(),
            ],
            ..Default::default()
        };
        let discovery = KeywordDiscovery::new(Vec::new(), &settings);
        let found = discovery.discover().await;
        assert_eq!(found.origin, DiscoveryOrigin::Fallback);
        let texts: Vec<_> = found.terms.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["AI", "투자", "부동산 시장 전망"]);
    }

    #[tokio::test]
    async fn blank_fallback_list_still_yields_terms() {
        let settings = DiscoverySettings {
            fallback_terms: vec!["  ".into()],
            ..Default::default()
        };
        let discovery = KeywordDiscovery::new(Vec::new(), &settings);
        assert!(!discovery.discover().await.terms.is_empty());
    }
}

use std::sync::Arc;
use std::time::Duration;

use ai_client::{OpenAi, TextAgent};
use notion_client::NotionClient;
use trendsignal_common::settings::{ContextSourceKind, TrendSourceKind};
use trendsignal_common::{Credentials, Settings};

use crate::context::{ContextCollector, ContextSource, NaverNewsSource, SearchPageSource};
use crate::discovery::{DataLabSource, KeywordDiscovery, TrendSource, TrendingPageSource};
use crate::extractor::InsightExtractor;
use crate::fetcher::{HttpFetcher, SourceFetcher};
use crate::publisher::{DryRunPublisher, NotionPublisher, RecordLayout, RecordPublisher};

const NOTION_TIMEOUT: Duration = Duration::from_secs(30);

/// The four pipeline stages, wired and shareable across term tasks.
#[derive(Clone)]
pub struct ScoutDeps {
    pub discovery: Arc<KeywordDiscovery>,
    pub collector: Arc<ContextCollector>,
    pub extractor: Arc<InsightExtractor>,
    pub publisher: Arc<dyn RecordPublisher>,
}

impl ScoutDeps {
    pub fn new(
        discovery: Arc<KeywordDiscovery>,
        collector: Arc<ContextCollector>,
        extractor: Arc<InsightExtractor>,
        publisher: Arc<dyn RecordPublisher>,
    ) -> Self {
        Self {
            discovery,
            collector,
            extractor,
            publisher,
        }
    }

    /// Production wiring: HTTP fetcher, OpenAI, Notion (or dry run).
    pub fn from_config(
        credentials: &Credentials,
        settings: &Settings,
        dry_run: bool,
    ) -> anyhow::Result<Self> {
        let fetcher: Arc<dyn SourceFetcher> = Arc::new(HttpFetcher::new(
            Duration::from_secs(settings.runner.fetch_timeout_secs),
            &settings.runner.user_agent,
        )?);

        let mut openai = OpenAi::new(&credentials.openai_api_key, &settings.insight.model)
            .with_max_tokens(settings.insight.max_tokens)
            .with_timeout(Duration::from_secs(settings.insight.request_timeout_secs));
        if let Some(temperature) = settings.insight.temperature {
            openai = openai.with_temperature(temperature);
        }
        let agent: Arc<dyn TextAgent> = Arc::new(openai);

        let layout = RecordLayout::new(settings.publish.clone());
        let publisher: Arc<dyn RecordPublisher> = if dry_run {
            Arc::new(DryRunPublisher::new(layout))
        } else {
            let client = NotionClient::new(&credentials.notion_token, NOTION_TIMEOUT)?;
            Arc::new(NotionPublisher::new(
                client,
                &credentials.notion_database_id,
                layout,
            ))
        };

        Self::build(fetcher, agent, publisher, credentials, settings)
    }

    /// Wire configured sources over the given outbound boundaries.
    pub fn build(
        fetcher: Arc<dyn SourceFetcher>,
        agent: Arc<dyn TextAgent>,
        publisher: Arc<dyn RecordPublisher>,
        credentials: &Credentials,
        settings: &Settings,
    ) -> anyhow::Result<Self> {
        let mut trend_sources: Vec<Arc<dyn TrendSource>> = Vec::new();
        for kind in &settings.discovery.sources {
            match kind {
                TrendSourceKind::Datalab => trend_sources.push(Arc::new(DataLabSource::new(
                    fetcher.clone(),
                    credentials,
                    &settings.discovery,
                ))),
                TrendSourceKind::TrendingPage => trend_sources.push(Arc::new(
                    TrendingPageSource::new(fetcher.clone(), &settings.discovery.trending_page)?,
                )),
            }
        }

        let mut context_sources: Vec<Arc<dyn ContextSource>> = Vec::new();
        for kind in &settings.context.sources {
            match kind {
                ContextSourceKind::WebSearch => context_sources.push(Arc::new(
                    SearchPageSource::web(fetcher.clone(), &settings.context)?,
                )),
                ContextSourceKind::NewsSearch => context_sources.push(Arc::new(
                    SearchPageSource::news(fetcher.clone(), &settings.context)?,
                )),
                ContextSourceKind::NaverNews => context_sources.push(Arc::new(
                    NaverNewsSource::new(fetcher.clone(), credentials, &settings.context),
                )),
            }
        }

        Ok(Self::new(
            Arc::new(KeywordDiscovery::new(trend_sources, &settings.discovery)),
            Arc::new(ContextCollector::new(
                context_sources,
                settings.context.max_related_terms,
            )),
            Arc::new(InsightExtractor::new(agent, &settings.insight)),
            publisher,
        ))
    }
}

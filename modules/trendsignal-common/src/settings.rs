//! Pipeline tunables loaded from an optional TOML file.
//!
//! Credentials stay in the environment (see [`crate::Credentials`]); everything
//! here has a default, so a missing file means a default run.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::InsightSchema;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub discovery: DiscoverySettings,
    pub context: ContextSettings,
    pub insight: InsightSettings,
    pub publish: PublishSettings,
    pub runner: RunnerSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let settings = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::SettingsParse { message, .. } => ConfigError::SettingsParse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| ConfigError::SettingsParse {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.discovery;
        if d.max_terms == 0 {
            return Err(ConfigError::Invalid("discovery.max_terms must be at least 1".into()));
        }
        if d.min_term_chars > d.max_term_chars {
            return Err(ConfigError::Invalid(format!(
                "discovery.min_term_chars ({}) exceeds max_term_chars ({})",
                d.min_term_chars, d.max_term_chars
            )));
        }
        if !(0.0..=1.0).contains(&d.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "discovery.similarity_threshold must be within 0..=1, got {}",
                d.similarity_threshold
            )));
        }
        if !(1..=MAX_LOOKBACK_DAYS).contains(&d.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "discovery.lookback_days must be within 1..={MAX_LOOKBACK_DAYS}, got {}",
                d.lookback_days
            )));
        }
        if d.fallback_terms.is_empty() {
            return Err(ConfigError::Invalid(
                "discovery.fallback_terms must not be empty".into(),
            ));
        }
        if let Some(t) = self.insight.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "insight.temperature must be within 0..=2, got {t}"
                )));
            }
        }
        if self.runner.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid("runner.fetch_timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

// --- Discovery ---

/// Search-volume history does not reach further back than this.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSourceKind {
    /// Search-volume API over a fixed set of seed categories.
    Datalab,
    /// A public trending-searches page scraped with a selector cascade.
    TrendingPage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverySettings {
    pub sources: Vec<TrendSourceKind>,
    pub datalab_url: String,
    pub seed_categories: Vec<String>,
    pub lookback_days: i64,
    pub fallback_terms: Vec<String>,
    pub max_terms: usize,
    pub min_term_chars: usize,
    pub max_term_chars: usize,
    pub similarity_threshold: f64,
    /// A candidate with any whitespace token equal to one of these
    /// (ignoring case) is navigation chrome, not a search term.
    pub reject_tokens: Vec<String>,
    /// Decorations removed from candidates before the length check. Entries
    /// with letters or digits are only removed as whole tokens.
    pub strip_substrings: Vec<String>,
    pub trending_page: TrendingPageSettings,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const DEFAULT_TOPICS: &[&str] = &["인공지능", "투자", "부동산", "취업", "여행"];

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            sources: vec![TrendSourceKind::Datalab, TrendSourceKind::TrendingPage],
            datalab_url: "https://openapi.naver.com/v1/datalab/search".to_string(),
            seed_categories: strings(DEFAULT_TOPICS),
            lookback_days: 30,
            fallback_terms: strings(DEFAULT_TOPICS),
            max_terms: 5,
            min_term_chars: 3,
            max_term_chars: 49,
            similarity_threshold: 0.6,
            reject_tokens: strings(&[
                "더보기", "more", "realtime", "실시간", "검색어", "signal.bz", "시그널", "naver",
                "네이버", "로그인", "login",
            ]),
            strip_substrings: strings(&["NEW", "HOT", "▲", "▼", "↑", "↓"]),
            trending_page: TrendingPageSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrendingPageSettings {
    pub url: String,
    /// Tried in order; the first selector with any match wins.
    pub selectors: Vec<String>,
}

impl Default for TrendingPageSettings {
    fn default() -> Self {
        Self {
            url: "https://signal.bz/news".to_string(),
            selectors: strings(&[
                ".rank-layer .rank-text",
                "span.rank-text",
                "a.rank-item",
                "ol li a",
            ]),
        }
    }
}

// --- Context ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSourceKind {
    /// General web search result titles (plus related searches).
    WebSearch,
    /// News-tab search result titles.
    NewsSearch,
    /// News search API authenticated with the trend-source credential pair.
    NaverNews,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextSettings {
    pub sources: Vec<ContextSourceKind>,
    pub web_search_url: String,
    pub news_search_url: String,
    pub naver_news_url: String,
    pub web_limit: usize,
    pub news_limit: usize,
    pub naver_news_limit: usize,
    pub related_terms: bool,
    pub max_related_terms: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            sources: vec![ContextSourceKind::WebSearch, ContextSourceKind::NewsSearch],
            web_search_url: "https://www.google.com/search".to_string(),
            news_search_url: "https://www.google.com/search".to_string(),
            naver_news_url: "https://openapi.naver.com/v1/search/news.json".to_string(),
            web_limit: 5,
            news_limit: 3,
            naver_news_limit: 3,
            related_terms: true,
            max_related_terms: 5,
        }
    }
}

// --- Insight ---

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsightSettings {
    pub schema: InsightSchema,
    pub model: String,
    pub max_tokens: u32,
    /// Sampling temperature; the provider default when unset. Ignored by
    /// reasoning models.
    pub temperature: Option<f32>,
    /// Upper bound on the rendered context block, in bytes.
    pub max_context_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            schema: InsightSchema::Compact,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 800,
            temperature: None,
            max_context_bytes: 4000,
            request_timeout_secs: 60,
        }
    }
}

// --- Publish ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessPolicy {
    /// A term succeeds when its record was written, placeholder or not.
    #[default]
    RecordWritten,
    /// A term succeeds only when the record was written from a real analysis.
    FullAnalysis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSettings {
    pub title_property: String,
    pub date_property: String,
    /// Rich-text column for related terms; skipped when empty.
    pub related_property: String,
    /// Number column for the real snippet count; skipped when empty.
    pub count_property: String,
    /// Select column for the status tag; skipped when empty.
    pub status_property: String,
    pub status_tag: String,
    pub attach_snippets: bool,
    pub max_snippet_blocks: usize,
    pub success_policy: SuccessPolicy,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            title_property: "키워드".to_string(),
            date_property: "날짜".to_string(),
            related_property: String::new(),
            count_property: String::new(),
            status_property: String::new(),
            status_tag: "완료".to_string(),
            attach_snippets: true,
            max_snippet_blocks: 3,
            success_policy: SuccessPolicy::RecordWritten,
        }
    }
}

// --- Runner ---

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSettings {
    /// Pause between terms, respecting model and record-store rate limits.
    pub inter_term_delay_ms: u64,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            inter_term_delay_ms: 2000,
            fetch_timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
        }
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use trendsignal_common::settings::DiscoverySettings;
use trendsignal_common::{Credentials, FetchError, ParseError, SourceError};

use super::TrendSource;
use crate::fetcher::{RequestSpec, SourceFetcher};

/// The API accepts at most this many keyword groups per request, and ratios
/// are only comparable within one request.
const MAX_KEYWORD_GROUPS: usize = 5;

const SOURCE_NAME: &str = "datalab";

/// Search-volume trend API queried over the configured seed categories.
/// Yields the seeds ranked by mean search ratio over the lookback window.
pub struct DataLabSource {
    fetcher: Arc<dyn SourceFetcher>,
    url: String,
    client_id: String,
    client_secret: String,
    seeds: Vec<String>,
    lookback_days: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataLabRequest<'a> {
    start_date: String,
    end_date: String,
    time_unit: &'static str,
    keyword_groups: Vec<KeywordGroup<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeywordGroup<'a> {
    group_name: &'a str,
    keywords: [&'a str; 1],
}

#[derive(Deserialize)]
struct DataLabResponse {
    #[serde(default)]
    results: Vec<DataLabResult>,
}

#[derive(Deserialize)]
struct DataLabResult {
    title: String,
    #[serde(default)]
    data: Vec<DataPoint>,
}

#[derive(Deserialize)]
struct DataPoint {
    ratio: f64,
}

impl DataLabSource {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        credentials: &Credentials,
        settings: &DiscoverySettings,
    ) -> Self {
        if settings.seed_categories.len() > MAX_KEYWORD_GROUPS {
            tracing::warn!(
                seeds = settings.seed_categories.len(),
                max = MAX_KEYWORD_GROUPS,
                "Too many seed categories; extra seeds ignored"
            );
        }
        Self {
            fetcher,
            url: settings.datalab_url.clone(),
            client_id: credentials.naver_client_id.clone(),
            client_secret: credentials.naver_client_secret.clone(),
            seeds: settings
                .seed_categories
                .iter()
                .take(MAX_KEYWORD_GROUPS)
                .cloned()
                .collect(),
            lookback_days: settings.lookback_days,
        }
    }

    pub fn request(&self, today: NaiveDate) -> Result<RequestSpec, SourceError> {
        let start = TimeDelta::try_days(self.lookback_days)
            .filter(|window| *window > TimeDelta::zero())
            .and_then(|window| today.checked_sub_signed(window))
            .ok_or_else(|| FetchError::InvalidRequest {
                url: self.url.clone(),
                message: format!("lookback window of {} days is out of range", self.lookback_days),
            })?;
        let body = DataLabRequest {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: today.format("%Y-%m-%d").to_string(),
            time_unit: "date",
            keyword_groups: self
                .seeds
                .iter()
                .map(|seed| KeywordGroup {
                    group_name: seed.as_str(),
                    keywords: [seed.as_str()],
                })
                .collect(),
        };
        // Serializing a struct of strings cannot fail.
        let body = serde_json::to_value(&body).unwrap_or_default();
        Ok(RequestSpec::post_json(&self.url, body)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret))
    }
}

/// Group titles ordered by mean ratio, highest first. Ties keep API order.
pub(crate) fn rank_by_mean_ratio(body: &str) -> Result<Vec<String>, ParseError> {
    let response: DataLabResponse =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;
    if response.results.is_empty() {
        return Err(ParseError::NoMatches {
            source_name: SOURCE_NAME.to_string(),
        });
    }
    let mut scored: Vec<(String, f64)> = response
        .results
        .into_iter()
        .map(|r| {
            let mean = if r.data.is_empty() {
                0.0
            } else {
                r.data.iter().map(|d| d.ratio).sum::<f64>() / r.data.len() as f64
            };
            (r.title, mean)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(scored.into_iter().map(|(title, _)| title).collect())
}

#[async_trait]
impl TrendSource for DataLabSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn curated(&self) -> bool {
        true
    }

    async fn candidates(&self) -> Result<Vec<String>, SourceError> {
        let spec = self.request(Local::now().date_naive())?;
        let response = self.fetcher.fetch(&spec).await?;
        Ok(rank_by_mean_ratio(&response.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    fn credentials() -> Credentials {
        Credentials::from_lookup(|name| Some(format!("{name}-value"))).unwrap()
    }

    const RESPONSE: &str = r#"{
        "startDate": "2024-05-01", "endDate": "2024-05-31", "timeUnit": "date",
        "results": [
            {"title": "투자", "keywords": ["투자"], "data": [{"period": "2024-05-01", "ratio": 10.0}, {"period": "2024-05-02", "ratio": 20.0}]},
            {"title": "여행", "keywords": ["여행"], "data": [{"period": "2024-05-01", "ratio": 90.0}, {"period": "2024-05-02", "ratio": 100.0}]},
            {"title": "취업", "keywords": ["취업"], "data": []}
        ]
    }"#;

    #[test]
    fn request_body_covers_lookback_window() {
        let source = DataLabSource::new(
            Arc::new(MockFetcher::new()),
            &credentials(),
            &DiscoverySettings::default(),
        );
        let spec = source.request(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()).unwrap();
        let body = spec.json.unwrap();
        assert_eq!(body["startDate"], "2024-05-01");
        assert_eq!(body["endDate"], "2024-05-31");
        assert_eq!(body["timeUnit"], "date");
        assert_eq!(body["keywordGroups"][0]["groupName"], "인공지능");
        assert_eq!(body["keywordGroups"][0]["keywords"][0], "인공지능");
        assert_eq!(body["keywordGroups"].as_array().unwrap().len(), 5);
        assert!(spec
            .headers
            .contains(&("X-Naver-Client-Id".to_string(), "NAVER_CLIENT_ID-value".to_string())));
    }

    #[test]
    fn seeds_are_capped_at_api_limit() {
        let settings = DiscoverySettings {
            seed_categories: (1..=7).map(|i| format!("seed {i}")).collect(),
            ..Default::default()
        };
        let source = DataLabSource::new(Arc::new(MockFetcher::new()), &credentials(), &settings);
        let spec = source.request(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()).unwrap();
        assert_eq!(spec.json.unwrap()["keywordGroups"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn out_of_range_lookback_is_source_error() {
        for lookback_days in [-7, 0, i64::MAX] {
            let settings = DiscoverySettings {
                lookback_days,
                ..Default::default()
            };
            let fetcher = Arc::new(MockFetcher::new().on("datalab", RESPONSE));
            let source = DataLabSource::new(fetcher.clone(), &credentials(), &settings);
            assert!(matches!(
                source.candidates().await,
                Err(SourceError::Fetch(FetchError::InvalidRequest { .. }))
            ));
            assert!(fetcher.requests().is_empty());
        }
    }

    #[test]
    fn ranks_by_mean_ratio() {
        assert_eq!(rank_by_mean_ratio(RESPONSE).unwrap(), vec!["여행", "투자", "취업"]);
    }

    #[test]
    fn malformed_body_is_parse_error() {
        assert!(matches!(
            rank_by_mean_ratio("<html>"),
            Err(ParseError::InvalidJson { .. })
        ));
        assert!(matches!(
            rank_by_mean_ratio(r#"{"results": []}"#),
            Err(ParseError::NoMatches { .. })
        ));
    }

    #[tokio::test]
    async fn candidates_through_fetcher() {
        let fetcher = Arc::new(MockFetcher::new().on("datalab", RESPONSE));
        let source = DataLabSource::new(fetcher.clone(), &credentials(), &DiscoverySettings::default());
        assert_eq!(source.candidates().await.unwrap()[0], "여행");
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_as_source_error() {
        let fetcher = Arc::new(MockFetcher::new().on_error(
            "datalab",
            FetchError::HttpStatus {
                url: "datalab".into(),
                status: 401,
                body: "unauthorized".into(),
            },
        ));
        let source = DataLabSource::new(fetcher, &credentials(), &DiscoverySettings::default());
        assert!(matches!(
            source.candidates().await,
            Err(SourceError::Fetch(FetchError::HttpStatus { status: 401, .. }))
        ));
    }
}

//! Discovery bounds across every combination of trend-source behavior.

use std::sync::Arc;

use trendsignal_common::settings::DiscoverySettings;
use trendsignal_common::{Credentials, FetchError};
use trendsignal_scout::discovery::{
    DataLabSource, DiscoveryOrigin, KeywordDiscovery, TrendSource, TrendingPageSource,
};
use trendsignal_scout::terms::{token_overlap, TermRules};
use trendsignal_scout::testing::MockFetcher;

#[derive(Clone, Copy, Debug)]
enum Behavior {
    Healthy,
    Garbage,
    Failing,
}

const BEHAVIORS: [Behavior; 3] = [Behavior::Healthy, Behavior::Garbage, Behavior::Failing];

fn credentials() -> Credentials {
    Credentials::from_lookup(|name| Some(format!("{name}-value"))).unwrap()
}

fn datalab_body(count: usize) -> String {
    let results: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"title": "seed {i}", "keywords": ["seed {i}"], "data": [{{"period": "2024-06-01", "ratio": {}}}]}}"#,
                i as f64
            )
        })
        .collect();
    format!(r#"{{"results": [{}]}}"#, results.join(","))
}

fn trending_body() -> String {
    let spans: String = [
        "1신지 문원 돌싱",
        "2신지 문원 돌싱 근황",
        "3부동산 시장 전망",
        "4주식 시장 전망",
        "5아이폰 신제품 출시",
        "6여름 휴가 추천",
        "7환율 급등 원인",
        "8전기차 보조금",
        "9실시간 검색어",
    ]
    .iter()
    .map(|t| format!("<span class=\"rank-text\">{t}</span>"))
    .collect();
    format!("<html><body><div class=\"rank-layer\">{spans}</div></body></html>")
}

fn fetcher(datalab: Behavior, page: Behavior) -> MockFetcher {
    let timeout = |url: &str| FetchError::Timeout { url: url.to_string() };
    let mut fetcher = MockFetcher::new();
    fetcher = match datalab {
        Behavior::Healthy => fetcher.on("datalab", &datalab_body(5)),
        Behavior::Garbage => fetcher.on("datalab", "<html>captcha</html>"),
        Behavior::Failing => fetcher.on_error("datalab", timeout("datalab")),
    };
    match page {
        Behavior::Healthy => fetcher.on("signal.bz", &trending_body()),
        Behavior::Garbage => fetcher.on("signal.bz", "<html><span class=\"rank-text\">1</span></html>"),
        Behavior::Failing => fetcher.on_error("signal.bz", timeout("signal.bz")),
    }
}

fn discovery(fetcher: MockFetcher, settings: &DiscoverySettings) -> KeywordDiscovery {
    let fetcher = Arc::new(fetcher);
    let sources: Vec<Arc<dyn TrendSource>> = vec![
        Arc::new(DataLabSource::new(fetcher.clone(), &credentials(), settings)),
        Arc::new(TrendingPageSource::new(fetcher, &settings.trending_page).unwrap()),
    ];
    KeywordDiscovery::new(sources, settings)
}

#[tokio::test]
async fn never_empty_and_never_more_than_max() {
    let settings = DiscoverySettings::default();
    for datalab in BEHAVIORS {
        for page in BEHAVIORS {
            let found = discovery(fetcher(datalab, page), &settings).discover().await;
            assert!(
                !found.terms.is_empty() && found.terms.len() <= 5,
                "datalab={datalab:?} page={page:?} gave {} terms",
                found.terms.len()
            );
        }
    }
}

#[tokio::test]
async fn origin_follows_first_healthy_source() {
    let settings = DiscoverySettings::default();

    let found = discovery(fetcher(Behavior::Healthy, Behavior::Healthy), &settings).discover().await;
    assert_eq!(found.origin, DiscoveryOrigin::Source("datalab".into()));
    assert_eq!(found.terms[0].text, "seed 4");

    let found = discovery(fetcher(Behavior::Failing, Behavior::Healthy), &settings).discover().await;
    assert_eq!(found.origin, DiscoveryOrigin::Source("trending_page".into()));
    assert_eq!(found.terms[0].text, "신지 문원 돌싱");

    let found = discovery(fetcher(Behavior::Garbage, Behavior::Garbage), &settings).discover().await;
    assert_eq!(found.origin, DiscoveryOrigin::Fallback);
}

#[tokio::test]
async fn discovered_terms_are_never_near_duplicates() {
    let settings = DiscoverySettings {
        max_terms: 8,
        ..Default::default()
    };
    let found = discovery(fetcher(Behavior::Failing, Behavior::Healthy), &settings).discover().await;
    let texts: Vec<_> = found.terms.iter().map(|t| t.text.as_str()).collect();
    assert!(!texts.contains(&"신지 문원 돌싱 근황"));
    assert!(!texts.contains(&"실시간 검색어"));

    for (i, a) in texts.iter().enumerate() {
        for b in &texts[i + 1..] {
            assert!(
                token_overlap(a, b) <= settings.similarity_threshold,
                "{a:?} and {b:?} overlap"
            );
        }
    }
}

#[test]
fn dedup_holds_for_shuffled_inputs() {
    let rules = TermRules::from_settings(&DiscoverySettings::default());
    let pool = [
        "서울 아파트 가격",
        "서울 아파트 가격 상승",
        "아파트 가격 하락",
        "부산 여행 코스",
        "부산 여행",
        "제주 여행 코스",
        "여행 코스 추천",
    ];
    // Every rotation of the pool.
    for shift in 0..pool.len() {
        let rotated: Vec<&str> = pool[shift..].iter().chain(&pool[..shift]).copied().collect();
        let picked = rules.select(&rotated, pool.len());
        for (i, a) in picked.iter().enumerate() {
            for b in &picked[i + 1..] {
                assert!(token_overlap(&a.text, &b.text) <= 0.6, "{a} / {b} at shift {shift}");
            }
        }
        assert!(!picked.is_empty());
    }
}

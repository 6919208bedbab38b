// Test mocks for the trend pipeline.
//
// Three mocks matching the three outbound trait boundaries:
// - MockFetcher (SourceFetcher): substring-matched URL -> canned response
// - MockTextAgent (TextAgent): term-matched canned replies or failures
// - MockPublisher (RecordPublisher): in-memory record log with injectable failures

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use ai_client::{AiError, TextAgent};
use trendsignal_common::settings::PublishSettings;
use trendsignal_common::{ContextBundle, FetchError, Insight, PublishError, PublishedRecord};

use crate::fetcher::{RawResponse, RequestSpec, SourceFetcher};
use crate::publisher::{PublishReceipt, RecordLayout, RecordPublisher};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Responds to the first rule whose pattern occurs in the request's full URL.
/// Unregistered URLs fail with a network error.
pub struct MockFetcher {
    rules: Vec<(String, Result<RawResponse, FetchError>)>,
    requests: Mutex<Vec<RequestSpec>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, url_contains: &str, body: &str) -> Self {
        self.rules
            .push((url_contains.to_string(), Ok(RawResponse::ok(body))));
        self
    }

    pub fn on_error(mut self, url_contains: &str, error: FetchError) -> Self {
        self.rules.push((url_contains.to_string(), Err(error)));
        self
    }

    /// Every request made so far, in order.
    pub fn requests(&self) -> Vec<RequestSpec> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    async fn fetch(&self, spec: &RequestSpec) -> Result<RawResponse, FetchError> {
        self.requests.lock().unwrap().push(spec.clone());
        let url = spec.full_url();
        self.rules
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| {
                Err(FetchError::Network {
                    url: url.clone(),
                    message: "MockFetcher: nothing registered".to_string(),
                })
            })
    }
}

// ---------------------------------------------------------------------------
// MockTextAgent
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum MockReply {
    Text(String),
    Fail(String),
    Panic,
}

/// Replies chosen by which registered term the user prompt mentions.
pub struct MockTextAgent {
    rules: Vec<(String, MockReply)>,
    default: MockReply,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTextAgent {
    /// Every unmatched prompt gets `reply`.
    pub fn replying(reply: &str) -> Self {
        Self {
            rules: Vec::new(),
            default: MockReply::Text(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every unmatched prompt fails.
    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            default: MockReply::Fail("service unavailable".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_term(mut self, term: &str, reply: &str) -> Self {
        self.rules
            .push((term_marker(term), MockReply::Text(reply.to_string())));
        self
    }

    pub fn fail_on_term(mut self, term: &str) -> Self {
        self.rules.push((
            term_marker(term),
            MockReply::Fail(format!("injected failure for {term}")),
        ));
        self
    }

    pub fn panic_on_term(mut self, term: &str) -> Self {
        self.rules.push((term_marker(term), MockReply::Panic));
        self
    }

    /// (system, user) prompt pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

/// Prompts quote the term as '<term>'.
fn term_marker(term: &str) -> String {
    format!("'{term}'")
}

#[async_trait]
impl TextAgent for MockTextAgent {
    async fn complete(&self, system: &str, user: &str) -> ai_client::Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        let reply = self
            .rules
            .iter()
            .find(|(marker, _)| user.contains(marker.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| self.default.clone());
        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(message) => Err(AiError::Network(message)),
            MockReply::Panic => panic!("MockTextAgent: injected panic"),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

// ---------------------------------------------------------------------------
// MockPublisher
// ---------------------------------------------------------------------------

/// Lays records out like the real publisher and keeps them in memory.
pub struct MockPublisher {
    layout: RecordLayout,
    fail_terms: HashSet<String>,
    attempts: Mutex<Vec<String>>,
    records: Mutex<Vec<PublishedRecord>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            layout: RecordLayout::new(PublishSettings::default()),
            fail_terms: HashSet::new(),
            attempts: Mutex::new(Vec::new()),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on_term(mut self, term: &str) -> Self {
        self.fail_terms.insert(term.to_string());
        self
    }

    /// Terms a publish was attempted for, including failed ones.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    /// Records successfully written.
    pub fn records(&self) -> Vec<PublishedRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordPublisher for MockPublisher {
    async fn publish(
        &self,
        insight: &Insight,
        bundle: &ContextBundle,
    ) -> Result<PublishReceipt, PublishError> {
        let term = insight.term.text.clone();
        self.attempts.lock().unwrap().push(term.clone());
        if self.fail_terms.contains(&term) {
            return Err(PublishError::Rejected {
                status: 400,
                message: format!("injected failure for {term}"),
            });
        }
        let record = self.layout.build(insight, bundle, chrono::Local::now().date_naive());
        let mut records = self.records.lock().unwrap();
        records.push(record);
        Ok(PublishReceipt {
            id: format!("mock-{}", records.len()),
            url: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A well-formed compact-schema model reply.
pub fn compact_reply(need: &str, summary: &str, outlook: &str) -> String {
    format!("니즈: {need}\n요약: {summary}\n전망: {outlook}")
}

/// A search results page with one `<h3>` per title.
pub fn search_page(titles: &[&str]) -> String {
    let items: String = titles
        .iter()
        .map(|t| format!("<div class=\"g\"><a href=\"#\"><h3>{t}</h3></a></div>"))
        .collect();
    format!("<html><body><div id=\"search\">{items}</div></body></html>")
}

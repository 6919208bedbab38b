// PipelineRunner: discover terms, then collect, extract and publish each
// one in turn.
//
// Terms run strictly one after another with a pause in between. Each term
// runs in its own task so that even a panic stays inside its boundary; the
// run itself never fails once configuration has been accepted.

use std::fmt;
use std::time::Duration;

use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use trendsignal_common::settings::{Settings, SuccessPolicy};
use trendsignal_common::Term;

use super::stats::RunStats;
use crate::deps::ScoutDeps;
use crate::discovery::DiscoveryOrigin;

/// What happened to one term.
#[derive(Debug, Clone, PartialEq)]
pub struct TermOutcome {
    pub term: Term,
    /// `None` when the term task aborted before collection finished.
    pub context_placeholder: Option<bool>,
    /// `None` when the term task aborted before extraction finished.
    pub insight_degraded: Option<bool>,
    pub published: bool,
    pub aborted: bool,
    pub error: Option<String>,
}

impl TermOutcome {
    fn aborted(term: Term, reason: String) -> Self {
        Self {
            term,
            context_placeholder: None,
            insight_degraded: None,
            published: false,
            aborted: true,
            error: Some(reason),
        }
    }

    pub fn succeeded(&self, policy: SuccessPolicy) -> bool {
        match policy {
            SuccessPolicy::RecordWritten => self.published,
            SuccessPolicy::FullAnalysis => self.published && self.insight_degraded == Some(false),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub origin: DiscoveryOrigin,
    pub policy: SuccessPolicy,
    pub outcomes: Vec<TermOutcome>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn successes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded(self.policy))
            .count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// "successes/total"
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.successes(), self.total())
    }
}

pub struct PipelineRunner {
    deps: ScoutDeps,
    policy: SuccessPolicy,
    inter_term_delay: Duration,
}

impl PipelineRunner {
    pub fn new(deps: ScoutDeps, settings: &Settings) -> Self {
        Self {
            deps,
            policy: settings.publish.success_policy,
            inter_term_delay: Duration::from_millis(settings.runner.inter_term_delay_ms),
        }
    }

    pub fn with_inter_term_delay(mut self, delay: Duration) -> Self {
        self.inter_term_delay = delay;
        self
    }

    /// Full run: discovery, then every discovered term.
    pub async fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        async {
            info!("Discovering terms");
            let discovery = self.deps.discovery.discover().await;
            self.process(run_id, discovery.terms, discovery.origin).await
        }
        .instrument(span)
        .await
    }

    /// Run a fixed list of terms, skipping discovery.
    pub async fn run_terms(&self, terms: Vec<Term>) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        self.process(run_id, terms, DiscoveryOrigin::Operator)
            .instrument(span)
            .await
    }

    async fn process(&self, run_id: Uuid, terms: Vec<Term>, origin: DiscoveryOrigin) -> RunReport {
        info!(count = terms.len(), origin = %origin, "Processing terms");
        let mut outcomes = Vec::with_capacity(terms.len());

        for (i, term) in terms.iter().enumerate() {
            if i > 0 && !self.inter_term_delay.is_zero() {
                tokio::time::sleep(self.inter_term_delay).await;
            }
            let span = info_span!("term", term = %term, index = i + 1);
            let task = tokio::spawn(process_term(self.deps.clone(), term.clone()).instrument(span));
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(term = %term, error = %e, "Term task aborted");
                    TermOutcome::aborted(term.clone(), e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let stats = RunStats::tally(&origin.to_string(), &outcomes, self.policy);
        let report = RunReport {
            run_id,
            origin,
            policy: self.policy,
            outcomes,
            stats,
        };
        info!(
            successes = report.successes(),
            total = report.total(),
            policy = ?report.policy,
            "Run complete"
        );
        report
    }
}

/// Collect, extract, publish. Only the publish step can fail; earlier stages
/// degrade to placeholders.
async fn process_term(deps: ScoutDeps, term: Term) -> TermOutcome {
    let bundle = deps.collector.collect(&term).await;
    let insight = deps.extractor.extract(&term, &bundle).await;

    let (published, error) = match deps.publisher.publish(&insight, &bundle).await {
        Ok(receipt) => {
            info!(record_id = %receipt.id, "Term complete");
            (true, None)
        }
        Err(e) => {
            error!(error = %e, "Publish failed");
            (false, Some(e.to_string()))
        }
    };

    TermOutcome {
        term,
        context_placeholder: Some(bundle.is_placeholder()),
        insight_degraded: Some(insight.degraded),
        published,
        aborted: false,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use trendsignal_common::Credentials;

    use crate::testing::{compact_reply, search_page, MockFetcher, MockPublisher, MockTextAgent};

    fn credentials() -> Credentials {
        Credentials::from_lookup(|name| Some(format!("{name}-value"))).unwrap()
    }

    fn runner(fetcher: MockFetcher, agent: MockTextAgent, publisher: Arc<MockPublisher>) -> PipelineRunner {
        let settings = Settings::default();
        let deps = ScoutDeps::build(
            Arc::new(fetcher),
            Arc::new(agent),
            publisher,
            &credentials(),
            &settings,
        )
        .unwrap();
        PipelineRunner::new(deps, &settings).with_inter_term_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn discovery_failure_runs_fallback_terms() {
        let publisher = Arc::new(MockPublisher::new());
        let report = runner(
            MockFetcher::new(),
            MockTextAgent::replying(&compact_reply("a", "b", "c")),
            publisher.clone(),
        )
        .run()
        .await;

        assert_eq!(report.origin, DiscoveryOrigin::Fallback);
        assert_eq!(report.total(), 5);
        assert_eq!(report.to_string(), "5/5");
        assert_eq!(publisher.attempts(), vec!["인공지능", "투자", "부동산", "취업", "여행"]);
        assert_eq!(report.stats.contexts_placeholder, 5);
    }

    #[tokio::test]
    async fn collected_context_reaches_the_record() {
        let fetcher = MockFetcher::new().on("google.com/search", &search_page(&["결과 하나", "결과 둘"]));
        let publisher = Arc::new(MockPublisher::new());
        let report = runner(fetcher, MockTextAgent::replying(&compact_reply("a", "b", "c")), publisher.clone())
            .run_terms(vec![Term::verbatim("AI")])
            .await;

        assert_eq!(report.to_string(), "1/1");
        let record = &publisher.records()[0];
        assert_eq!(record.result_count, Some(2));
        assert_eq!(record.snippets, vec!["결과 하나", "결과 둘"]);
        assert_eq!(report.stats.contexts_collected, 1);
    }

    #[tokio::test]
    async fn panicking_term_does_not_stop_the_run() {
        let publisher = Arc::new(MockPublisher::new());
        let agent = MockTextAgent::replying(&compact_reply("a", "b", "c")).panic_on_term("boom");
        let report = runner(MockFetcher::new(), agent, publisher.clone())
            .run_terms(vec![Term::verbatim("boom"), Term::verbatim("after")])
            .await;

        assert_eq!(report.to_string(), "1/2");
        assert!(report.outcomes[0].aborted);
        assert!(report.outcomes[1].published);
        assert_eq!(publisher.attempts(), vec!["after"]);
        assert_eq!(report.stats.terms_aborted, 1);
    }

    #[tokio::test]
    async fn empty_term_list_reports_zero() {
        let report = runner(MockFetcher::new(), MockTextAgent::failing(), Arc::new(MockPublisher::new()))
            .run_terms(Vec::new())
            .await;
        assert_eq!(report.to_string(), "0/0");
    }

    #[tokio::test(start_paused = true)]
    async fn terms_are_spaced_by_the_delay() {
        let start = tokio::time::Instant::now();
        let report = runner(MockFetcher::new(), MockTextAgent::failing(), Arc::new(MockPublisher::new()))
            .with_inter_term_delay(Duration::from_secs(2))
            .run_terms(vec![Term::verbatim("one"), Term::verbatim("two"), Term::verbatim("three")])
            .await;
        assert_eq!(report.total(), 3);
        assert!(start.elapsed() >= Duration::from_secs(4));
    }
}

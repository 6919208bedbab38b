use trendsignal_common::settings::SuccessPolicy;

use super::runner::TermOutcome;

/// Stats from a trend run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunStats {
    pub terms: u32,
    pub discovery_origin: String,
    pub contexts_collected: u32,
    pub contexts_placeholder: u32,
    pub insights_extracted: u32,
    pub insights_degraded: u32,
    pub records_published: u32,
    pub records_failed: u32,
    pub terms_aborted: u32,
    pub succeeded: u32,
}

impl RunStats {
    pub fn tally(origin: &str, outcomes: &[TermOutcome], policy: SuccessPolicy) -> Self {
        let mut stats = RunStats {
            terms: outcomes.len() as u32,
            discovery_origin: origin.to_string(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome.context_placeholder {
                Some(true) => stats.contexts_placeholder += 1,
                Some(false) => stats.contexts_collected += 1,
                None => {}
            }
            match outcome.insight_degraded {
                Some(true) => stats.insights_degraded += 1,
                Some(false) => stats.insights_extracted += 1,
                None => {}
            }
            if outcome.published {
                stats.records_published += 1;
            } else if outcome.aborted {
                stats.terms_aborted += 1;
            } else {
                stats.records_failed += 1;
            }
            if outcome.succeeded(policy) {
                stats.succeeded += 1;
            }
        }
        stats
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Trend Run Complete ===")?;
        writeln!(f, "Terms:               {} (from {})", self.terms, self.discovery_origin)?;
        writeln!(f, "Context collected:   {}", self.contexts_collected)?;
        writeln!(f, "Context placeholder: {}", self.contexts_placeholder)?;
        writeln!(f, "Insights extracted:  {}", self.insights_extracted)?;
        writeln!(f, "Insights degraded:   {}", self.insights_degraded)?;
        writeln!(f, "Records published:   {}", self.records_published)?;
        writeln!(f, "Records failed:      {}", self.records_failed)?;
        if self.terms_aborted > 0 {
            writeln!(f, "Terms aborted:       {}", self.terms_aborted)?;
        }
        write!(f, "Succeeded:           {}/{}", self.succeeded, self.terms)
    }
}

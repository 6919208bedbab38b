// Context collection: auxiliary evidence for one term.
//
// Each source is guarded on its own. A failing source contributes nothing,
// and a term whose sources all fail gets the placeholder bundle.

mod naver_news;
mod search_page;

pub use naver_news::{strip_markup, NaverNewsSource};
pub use search_page::SearchPageSource;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use trendsignal_common::{ContextBundle, Snippet, SourceError, Term};

/// What one source found for a term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceContext {
    pub snippets: Vec<Snippet>,
    pub related_terms: Vec<String>,
}

#[async_trait]
pub trait ContextSource: Send + Sync {
    fn name(&self) -> &str;
    async fn collect(&self, term: &Term) -> Result<SourceContext, SourceError>;
}

pub struct ContextCollector {
    sources: Vec<Arc<dyn ContextSource>>,
    max_related_terms: usize,
}

impl ContextCollector {
    pub fn new(sources: Vec<Arc<dyn ContextSource>>, max_related_terms: usize) -> Self {
        Self {
            sources,
            max_related_terms,
        }
    }

    /// Never fails and never returns an empty bundle.
    pub async fn collect(&self, term: &Term) -> ContextBundle {
        let mut snippets: Vec<Snippet> = Vec::new();
        let mut seen_titles: HashSet<String> = HashSet::new();
        let mut related: Vec<String> = Vec::new();

        for source in &self.sources {
            match source.collect(term).await {
                Ok(found) => {
                    debug!(
                        source = source.name(),
                        snippets = found.snippets.len(),
                        related = found.related_terms.len(),
                        "Context source returned"
                    );
                    for snippet in found.snippets {
                        if seen_titles.insert(snippet.title.clone()) {
                            snippets.push(snippet);
                        }
                    }
                    for candidate in found.related_terms {
                        if related.len() >= self.max_related_terms {
                            break;
                        }
                        let same_as_term = candidate.eq_ignore_ascii_case(&term.text);
                        if !same_as_term && !related.contains(&candidate) {
                            related.push(candidate);
                        }
                    }
                }
                Err(e) => {
                    warn!(source = source.name(), term = %term, error = %e, "Context source failed");
                }
            }
        }

        let bundle = ContextBundle::from_snippets(term.clone(), snippets, related);
        if bundle.is_placeholder() {
            warn!(term = %term, "No context collected, using placeholder snippets");
        } else {
            info!(
                term = %term,
                snippets = bundle.real_snippet_count(),
                related = bundle.related_terms.len(),
                "Context collected"
            );
        }
        bundle
    }
}

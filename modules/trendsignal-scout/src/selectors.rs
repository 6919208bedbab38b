use scraper::{Html, Selector};
use tracing::debug;

use trendsignal_common::ParseError;

/// Pulls candidate strings out of a fetched document.
pub trait CandidateExtractor: Send + Sync {
    fn name(&self) -> &str;
    fn extract(&self, document: &str) -> Result<Vec<String>, ParseError>;
}

/// Ordered selector fallbacks. The first selector that yields any non-empty
/// text wins; later selectors are not consulted.
pub struct SelectorCascade {
    name: String,
    selectors: Vec<(String, Selector)>,
    limit: Option<usize>,
}

impl SelectorCascade {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, selectors: &[S]) -> Result<Self, ParseError> {
        let selectors = selectors
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                Selector::parse(raw)
                    .map(|sel| (raw.to_string(), sel))
                    .map_err(|e| ParseError::InvalidSelector {
                        selector: raw.to_string(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            selectors,
            limit: None,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl CandidateExtractor for SelectorCascade {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, document: &str) -> Result<Vec<String>, ParseError> {
        let html = Html::parse_document(document);
        for (raw, selector) in &self.selectors {
            let mut texts: Vec<String> = html
                .select(selector)
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .filter(|t| !t.is_empty())
                .collect();
            if texts.is_empty() {
                continue;
            }
            if let Some(limit) = self.limit {
                texts.truncate(limit);
            }
            debug!(source = %self.name, selector = %raw, count = texts.len(), "Selector matched");
            return Ok(texts);
        }
        Err(ParseError::NoMatches {
            source_name: self.name.clone(),
        })
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Candidate cleaning and near-duplicate suppression for discovered terms.

use std::collections::HashSet;

use tracing::debug;

use trendsignal_common::settings::DiscoverySettings;
use trendsignal_common::Term;

use crate::selectors::collapse_whitespace;

/// Rules applied to raw candidates before they become terms.
#[derive(Debug, Clone)]
pub struct TermRules {
    pub min_chars: usize,
    pub max_chars: usize,
    pub similarity_threshold: f64,
    reject_tokens: HashSet<String>,
    strip_substrings: Vec<String>,
}

impl TermRules {
    pub fn from_settings(settings: &DiscoverySettings) -> Self {
        Self {
            min_chars: settings.min_term_chars,
            max_chars: settings.max_term_chars,
            similarity_threshold: settings.similarity_threshold,
            reject_tokens: settings
                .reject_tokens
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            strip_substrings: settings.strip_substrings.clone(),
        }
    }

    /// Normalize one raw candidate, or `None` when it is not a usable term.
    pub fn clean(&self, raw: &str) -> Option<Term> {
        let text = self.strip_decorations(strip_rank_prefix(&collapse_whitespace(raw)));

        // Rank numbers, arrows, separators.
        if !text.chars().any(char::is_alphabetic) {
            return None;
        }
        if text
            .split_whitespace()
            .any(|tok| self.reject_tokens.contains(&tok.to_lowercase()))
        {
            return None;
        }
        let len = text.chars().count();
        if len < self.min_chars || len > self.max_chars {
            return None;
        }
        Some(Term::new(raw.trim(), text))
    }

    /// Symbol decorations ("▲") go wherever they appear. Word decorations
    /// ("NEW") go only as whole tokens, so "NEWJEANS" and "HOTEL" survive.
    fn strip_decorations(&self, text: &str) -> String {
        let mut text = text.to_string();
        for noise in self.strip_substrings.iter().filter(|n| !is_word_like(n)) {
            if !noise.is_empty() {
                text = text.replace(noise.as_str(), " ");
            }
        }
        text.split_whitespace()
            .filter(|tok| !self.strip_substrings.iter().any(|n| n == tok))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// True when `candidate` shares too many tokens with any kept term.
    pub fn is_near_duplicate(&self, candidate: &Term, kept: &[Term]) -> bool {
        kept.iter()
            .any(|k| token_overlap(&k.text, &candidate.text) > self.similarity_threshold)
    }

    /// Clean, deduplicate and cap a candidate list, preserving source order.
    pub fn select<I, S>(&self, candidates: I, max_terms: usize) -> Vec<Term>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept: Vec<Term> = Vec::new();
        for raw in candidates {
            if kept.len() >= max_terms {
                break;
            }
            let Some(term) = self.clean(raw.as_ref()) else {
                debug!(candidate = raw.as_ref(), "Rejected candidate");
                continue;
            };
            if self.is_near_duplicate(&term, &kept) {
                debug!(term = %term, "Skipped near-duplicate");
                continue;
            }
            kept.push(term);
        }
        kept
    }

    /// Operator-curated candidates (seed categories) skip cleaning; only
    /// near-duplicates and the cap apply.
    pub fn select_curated<I, S>(&self, candidates: I, max_terms: usize) -> Vec<Term>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept: Vec<Term> = Vec::new();
        for raw in candidates {
            if kept.len() >= max_terms {
                break;
            }
            let text = collapse_whitespace(raw.as_ref());
            if text.is_empty() {
                continue;
            }
            let term = Term::verbatim(text);
            if !self.is_near_duplicate(&term, &kept) {
                kept.push(term);
            }
        }
        kept
    }
}

fn is_word_like(s: &str) -> bool {
    s.chars().any(char::is_alphanumeric)
}

/// Drop a leading rank number ("1신지 문원" -> "신지 문원").
pub fn strip_rank_prefix(s: &str) -> &str {
    s.trim_start()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(|c: char| c == '.' || c == ')')
        .trim()
}

/// Shared lowercase tokens over the size of the smaller token set.
///
/// Unlike Jaccard this treats "AI" and "AI 반도체" as fully overlapping, so a
/// short term and its longer variant never both survive.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let a_tokens: HashSet<&str> = a_lower.split_whitespace().collect();
    let b_tokens: HashSet<&str> = b_lower.split_whitespace().collect();
    let smaller = a_tokens.len().min(b_tokens.len());
    if smaller == 0 {
        return 0.0;
    }
    a_tokens.intersection(&b_tokens).count() as f64 / smaller as f64
}

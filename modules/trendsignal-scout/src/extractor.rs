// Insight extraction: prompt the model with a term's context and parse the
// line-prefixed reply into named fields.
//
// A failed call degrades to the placeholder insight. Nothing here returns an
// error to the runner.

use std::sync::Arc;

use tracing::{info, warn};

use ai_client::{strip_code_blocks, truncate_to_char_boundary, AiError, TextAgent};
use trendsignal_common::settings::InsightSettings;
use trendsignal_common::{
    ContextBundle, ExtractionError, Insight, InsightSchema, SnippetOrigin, Term,
};

pub const SYSTEM_PROMPT: &str = "당신은 트렌드 분석 전문가입니다.";

const ORIGIN_ORDER: [SnippetOrigin; 3] = [
    SnippetOrigin::WebSearch,
    SnippetOrigin::News,
    SnippetOrigin::Placeholder,
];

pub struct InsightExtractor {
    agent: Arc<dyn TextAgent>,
    schema: InsightSchema,
    max_context_bytes: usize,
}

impl InsightExtractor {
    pub fn new(agent: Arc<dyn TextAgent>, settings: &InsightSettings) -> Self {
        Self {
            agent,
            schema: settings.schema,
            max_context_bytes: settings.max_context_bytes,
        }
    }

    /// Always returns an insight; `degraded` is set when the placeholder was used.
    pub async fn extract(&self, term: &Term, bundle: &ContextBundle) -> Insight {
        match self.try_extract(term, bundle).await {
            Ok(insight) => {
                if insight.is_blank() {
                    warn!(term = %term, "Model reply matched no field prefixes");
                } else {
                    info!(term = %term, model = self.agent.model(), "Insight extracted");
                }
                insight
            }
            Err(e) => {
                warn!(term = %term, error = %e, "Insight extraction failed, using placeholder");
                Insight::placeholder(term.clone(), self.schema)
            }
        }
    }

    pub async fn try_extract(
        &self,
        term: &Term,
        bundle: &ContextBundle,
    ) -> Result<Insight, ExtractionError> {
        let prompt = build_prompt(term, bundle, self.schema, self.max_context_bytes);
        let reply = self
            .agent
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| match e {
                AiError::EmptyResponse => ExtractionError::EmptyResponse,
                other => ExtractionError::Request(other.to_string()),
            })?;
        if reply.trim().is_empty() {
            return Err(ExtractionError::EmptyResponse);
        }
        Ok(parse_insight(term, self.schema, &reply))
    }
}

/// User prompt: grouped context, related terms, then the output contract.
pub fn build_prompt(
    term: &Term,
    bundle: &ContextBundle,
    schema: InsightSchema,
    max_context_bytes: usize,
) -> String {
    let mut context = String::new();
    for origin in ORIGIN_ORDER {
        let lines: Vec<String> = bundle.by_origin(origin).map(|s| s.to_string()).collect();
        if !lines.is_empty() {
            context.push_str(&format!("{}: {}\n", origin.label(), lines.join(" / ")));
        }
    }
    if !bundle.related_terms.is_empty() {
        context.push_str(&format!("연관 검색어: {}\n", bundle.related_terms.join(", ")));
    }
    let context = truncate_to_char_boundary(&context, max_context_bytes);

    let mut prompt = format!(
        "다음은 '{}' 키워드에 대한 검색 및 뉴스 데이터입니다:\n\n{}\n",
        term.text,
        context.trim_end()
    );
    prompt.push_str("\n위 데이터를 분석하여 다음 형식으로 답변해주세요:\n");
    for field in schema.fields() {
        prompt.push_str(&format!("{} {}\n", field.prefix, field.guidance));
    }
    prompt
}

/// Parse a line-prefixed reply. A line starting with a field prefix opens that
/// field; following non-matching lines are appended to it. Lines before the
/// first prefix are ignored and absent fields stay empty.
pub fn parse_insight(term: &Term, schema: InsightSchema, reply: &str) -> Insight {
    let mut insight = Insight::empty(term.clone(), schema);

    // Longest prefix first so "향후 전망:" never reads as "전망:".
    let mut fields: Vec<_> = schema.fields().iter().collect();
    fields.sort_by_key(|f| std::cmp::Reverse(f.prefix.chars().count()));

    let mut current: Option<&'static str> = None;
    for line in strip_code_blocks(reply).lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let bare = line.trim_start_matches(|c: char| c == '*' || c == '#' || c == '-' || c.is_whitespace());
        if let Some(field) = fields.iter().find(|f| bare.starts_with(f.prefix)) {
            current = Some(field.key);
            let value = bare[field.prefix.len()..]
                .trim_start_matches('*')
                .trim();
            if !value.is_empty() {
                insight.append(field.key, value);
            }
            continue;
        }
        if let Some(key) = current {
            insight.append(key, line);
        }
    }
    insight
}

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// --- Term ---

/// A normalized search phrase analyzed in one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    /// The candidate as scraped or returned by the trend source.
    pub raw: String,
    /// The cleaned phrase used for every downstream request.
    pub text: String,
}

impl Term {
    pub fn new(raw: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            text: text.into(),
        }
    }

    /// A term supplied directly (fallback list, CLI), already clean.
    pub fn verbatim(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: text.clone(),
            text,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// --- Context ---

/// Where a snippet came from. Drives how it is grouped in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetOrigin {
    WebSearch,
    News,
    Placeholder,
}

impl SnippetOrigin {
    /// Prompt heading for snippets of this origin.
    pub fn label(&self) -> &'static str {
        match self {
            SnippetOrigin::WebSearch => "검색 결과",
            SnippetOrigin::News => "뉴스 결과",
            SnippetOrigin::Placeholder => "참고",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub origin: SnippetOrigin,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Snippet {
    pub fn new(origin: SnippetOrigin, title: impl Into<String>) -> Self {
        Self {
            origin,
            title: title.into(),
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        if !summary.trim().is_empty() {
            self.summary = Some(summary);
        }
        self
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.summary {
            Some(ref summary) => write!(f, "{} - {}", self.title, summary),
            None => f.write_str(&self.title),
        }
    }
}

/// Auxiliary evidence gathered for one term. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    pub term: Term,
    snippets: Vec<Snippet>,
    #[serde(default)]
    pub related_terms: Vec<String>,
}

impl ContextBundle {
    /// Build a bundle from collected snippets, substituting the placeholder
    /// set when collection yielded nothing.
    pub fn from_snippets(term: Term, snippets: Vec<Snippet>, related_terms: Vec<String>) -> Self {
        if snippets.is_empty() {
            let mut bundle = Self::placeholder(term);
            bundle.related_terms = related_terms;
            return bundle;
        }
        Self {
            term,
            snippets,
            related_terms,
        }
    }

    /// Deterministic stand-in context derived from the term alone.
    pub fn placeholder(term: Term) -> Self {
        let snippets = vec![
            Snippet::new(SnippetOrigin::Placeholder, format!("{} trend analysis", term.text)),
            Snippet::new(SnippetOrigin::Placeholder, format!("{} market overview", term.text)),
        ];
        Self {
            term,
            snippets,
            related_terms: Vec::new(),
        }
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn is_placeholder(&self) -> bool {
        self.snippets
            .iter()
            .all(|s| s.origin == SnippetOrigin::Placeholder)
    }

    /// Number of snippets that came from a real source.
    pub fn real_snippet_count(&self) -> usize {
        self.snippets
            .iter()
            .filter(|s| s.origin != SnippetOrigin::Placeholder)
            .count()
    }

    pub fn by_origin(&self, origin: SnippetOrigin) -> impl Iterator<Item = &Snippet> {
        self.snippets.iter().filter(move |s| s.origin == origin)
    }
}

// --- Insight ---

/// One named field of an insight schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Stable identifier (`need`, `summary`, ...).
    pub key: &'static str,
    /// Line prefix the model is asked to emit, matched case-sensitively.
    pub prefix: &'static str,
    /// Record-store column name.
    pub column: &'static str,
    /// Instruction shown after the prefix in the output contract.
    pub guidance: &'static str,
    /// Degraded value; `{term}` is replaced with the term.
    pub placeholder: &'static str,
}

const COMPACT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "need",
        prefix: "니즈:",
        column: "니즈",
        guidance: "[이 트렌드가 반영하는 소비자 니즈나 심리적 욕구]",
        placeholder: "분석 실패",
    },
    FieldSpec {
        key: "summary",
        prefix: "요약:",
        column: "요약",
        guidance: "[마케팅 인사이트 1-2줄 요약]",
        placeholder: "{term}에 대한 분석을 완료하지 못했습니다.",
    },
    FieldSpec {
        key: "outlook",
        prefix: "전망:",
        column: "전망",
        guidance: "[향후 트렌드 전망]",
        placeholder: "추후 재분석 필요",
    },
];

const RICH_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "background",
        prefix: "배경:",
        column: "배경",
        guidance: "[이 키워드가 주목받는 배경과 맥락]",
        placeholder: "분석 실패",
    },
    FieldSpec {
        key: "consumer_needs",
        prefix: "소비자 니즈:",
        column: "소비자 니즈",
        guidance: "[이 트렌드가 반영하는 소비자 니즈나 심리적 욕구]",
        placeholder: "분석 실패",
    },
    FieldSpec {
        key: "marketing_insights",
        prefix: "마케팅 인사이트:",
        column: "마케팅 인사이트",
        guidance: "[브랜드가 활용할 수 있는 마케팅 인사이트 2-3줄]",
        placeholder: "{term}에 대한 분석을 완료하지 못했습니다.",
    },
    FieldSpec {
        key: "future_outlook",
        prefix: "향후 전망:",
        column: "향후 전망",
        guidance: "[향후 트렌드 전망]",
        placeholder: "추후 재분석 필요",
    },
];

/// Which named-field layout the model is asked for and parsed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSchema {
    /// need / summary / outlook
    #[default]
    Compact,
    /// background / consumer_needs / marketing_insights / future_outlook
    Rich,
}

impl InsightSchema {
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            InsightSchema::Compact => COMPACT_FIELDS,
            InsightSchema::Rich => RICH_FIELDS,
        }
    }
}

/// Structured output of the model for one term.
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub term: Term,
    pub schema: InsightSchema,
    /// One value per schema field, in schema order.
    values: Vec<String>,
    /// True when the placeholder was substituted for a failed analysis.
    pub degraded: bool,
}

impl Insight {
    /// An insight with every field empty.
    pub fn empty(term: Term, schema: InsightSchema) -> Self {
        Self {
            term,
            schema,
            values: vec![String::new(); schema.fields().len()],
            degraded: false,
        }
    }

    /// The deterministic "analysis unavailable" insight.
    pub fn placeholder(term: Term, schema: InsightSchema) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|f| f.placeholder.replace("{term}", &term.text))
            .collect();
        Self {
            term,
            schema,
            values,
            degraded: true,
        }
    }

    pub fn get(&self, key: &str) -> &str {
        self.schema
            .fields()
            .iter()
            .position(|f| f.key == key)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Replace a field's value. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Some(idx) = self.schema.fields().iter().position(|f| f.key == key) {
            self.values[idx] = value.into();
        }
    }

    /// Append a continuation line to a field, newline-separated.
    pub fn append(&mut self, key: &str, line: &str) {
        if let Some(idx) = self.schema.fields().iter().position(|f| f.key == key) {
            let slot = &mut self.values[idx];
            if !slot.is_empty() {
                slot.push('\n');
            }
            slot.push_str(line);
        }
    }

    /// (field spec, value) pairs in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSpec, &str)> {
        self.schema
            .fields()
            .iter()
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }
}

// --- Published record ---

/// The record-store representation of one term's insight for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedRecord {
    pub term: String,
    pub date: NaiveDate,
    /// (column, value) per insight field, in schema order.
    pub fields: Vec<(String, String)>,
    pub related_terms: Vec<String>,
    pub result_count: Option<u32>,
    pub status: Option<String>,
    /// Top snippets rendered as supplementary content blocks.
    pub snippets: Vec<String>,
    pub degraded: bool,
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Notion caps a single rich-text segment at 2000 characters.
pub const MAX_TEXT_CHARS: usize = 2000;

// --- Rich text ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichText {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub content: String,
}

impl RichText {
    fn plain(content: String) -> Self {
        Self {
            kind: "text",
            text: TextContent { content },
        }
    }
}

/// Split text into segments of at most [`MAX_TEXT_CHARS`] characters.
/// Empty input yields a single empty segment so the property is still set.
pub fn rich_text(content: &str) -> Vec<RichText> {
    if content.is_empty() {
        return vec![RichText::plain(String::new())];
    }
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(MAX_TEXT_CHARS)
        .map(|chunk| RichText::plain(chunk.iter().collect()))
        .collect()
}

// --- Page properties ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateValue {
    pub start: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectValue {
    pub name: String,
}

/// A database property value. Serializes to the shape Notion expects,
/// e.g. `{"title": [...]}` or `{"date": {"start": "2024-01-01"}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Date { date: DateValue },
    Number { number: Option<f64> },
    Select { select: SelectValue },
}

impl PropertyValue {
    pub fn title(content: &str) -> Self {
        PropertyValue::Title {
            title: rich_text(content),
        }
    }

    pub fn rich_text(content: &str) -> Self {
        PropertyValue::RichText {
            rich_text: rich_text(content),
        }
    }

    /// `start` is an ISO-8601 date (`YYYY-MM-DD`).
    pub fn date(start: impl Into<String>) -> Self {
        PropertyValue::Date {
            date: DateValue {
                start: start.into(),
            },
        }
    }

    pub fn number(value: f64) -> Self {
        PropertyValue::Number {
            number: Some(value),
        }
    }

    pub fn select(name: impl Into<String>) -> Self {
        PropertyValue::Select {
            select: SelectValue { name: name.into() },
        }
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

// --- Blocks ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichTextBody {
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum BlockKind {
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: RichTextBody },
    #[serde(rename = "paragraph")]
    Paragraph { paragraph: RichTextBody },
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem { bulleted_list_item: RichTextBody },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub object: &'static str,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    fn new(kind: BlockKind) -> Self {
        Self {
            object: "block",
            kind,
        }
    }

    pub fn heading_2(content: &str) -> Self {
        Self::new(BlockKind::Heading2 {
            heading_2: RichTextBody {
                rich_text: rich_text(content),
            },
        })
    }

    pub fn paragraph(content: &str) -> Self {
        Self::new(BlockKind::Paragraph {
            paragraph: RichTextBody {
                rich_text: rich_text(content),
            },
        })
    }

    pub fn bulleted_list_item(content: &str) -> Self {
        Self::new(BlockKind::BulletedListItem {
            bulleted_list_item: RichTextBody {
                rich_text: rich_text(content),
            },
        })
    }
}

// --- Requests / responses ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parent {
    pub database_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePageRequest {
    pub parent: Parent,
    pub properties: Properties,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl CreatePageRequest {
    pub fn in_database(database_id: impl Into<String>) -> Self {
        Self {
            parent: Parent {
                database_id: database_id.into(),
            },
            properties: Properties::new(),
            children: Vec::new(),
        }
    }

    pub fn property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn child(mut self, block: Block) -> Self {
        self.children.push(block);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

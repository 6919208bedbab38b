// Record publishing: one record per term per run.
//
// RecordLayout decides what a record contains; publishers decide where it
// goes. The Notion publisher writes a database page, the dry-run publisher
// only logs.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use notion_client::{Block, CreatePageRequest, NotionClient, NotionError, PropertyValue};
use trendsignal_common::settings::PublishSettings;
use trendsignal_common::{ContextBundle, Insight, PublishError, PublishedRecord, SnippetOrigin};

const SNIPPET_HEADING: &str = "참고 자료";

#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait RecordPublisher: Send + Sync {
    async fn publish(
        &self,
        insight: &Insight,
        bundle: &ContextBundle,
    ) -> Result<PublishReceipt, PublishError>;
}

// --- Layout ---

/// Maps an insight and its context to the record-store shape.
#[derive(Debug, Clone)]
pub struct RecordLayout {
    settings: PublishSettings,
}

impl RecordLayout {
    pub fn new(settings: PublishSettings) -> Self {
        Self { settings }
    }

    pub fn build(&self, insight: &Insight, bundle: &ContextBundle, date: NaiveDate) -> PublishedRecord {
        let snippets = if self.settings.attach_snippets {
            bundle
                .snippets()
                .iter()
                .filter(|s| s.origin != SnippetOrigin::Placeholder)
                .take(self.settings.max_snippet_blocks)
                .map(|s| s.to_string())
                .collect()
        } else {
            Vec::new()
        };
        PublishedRecord {
            term: insight.term.text.clone(),
            date,
            fields: insight
                .fields()
                .map(|(spec, value)| (spec.column.to_string(), value.to_string()))
                .collect(),
            related_terms: bundle.related_terms.clone(),
            result_count: Some(bundle.real_snippet_count() as u32),
            status: Some(self.settings.status_tag.clone()).filter(|s| !s.is_empty()),
            snippets,
            degraded: insight.degraded,
        }
    }

    /// Page creation request for a record. Optional columns are only set
    /// when their property name is configured.
    pub fn page_request(&self, database_id: &str, record: &PublishedRecord) -> CreatePageRequest {
        let s = &self.settings;
        let mut request = CreatePageRequest::in_database(database_id)
            .property(&s.title_property, PropertyValue::title(&record.term))
            .property(
                &s.date_property,
                PropertyValue::date(record.date.format("%Y-%m-%d").to_string()),
            );
        for (column, value) in &record.fields {
            request = request.property(column, PropertyValue::rich_text(value));
        }
        if !s.related_property.is_empty() {
            request = request.property(
                &s.related_property,
                PropertyValue::rich_text(&record.related_terms.join(", ")),
            );
        }
        if let (false, Some(count)) = (s.count_property.is_empty(), record.result_count) {
            request = request.property(&s.count_property, PropertyValue::number(f64::from(count)));
        }
        if let (false, Some(status)) = (s.status_property.is_empty(), record.status.as_ref()) {
            request = request.property(&s.status_property, PropertyValue::select(status));
        }
        if !record.snippets.is_empty() {
            request = request.child(Block::heading_2(SNIPPET_HEADING));
            for snippet in &record.snippets {
                request = request.child(Block::bulleted_list_item(snippet));
            }
        }
        // Without a column for them, related terms go in the page body.
        if s.related_property.is_empty() && !record.related_terms.is_empty() {
            request = request.child(Block::paragraph(&format!(
                "연관 검색어: {}",
                record.related_terms.join(", ")
            )));
        }
        request
    }
}

// --- Notion ---

pub struct NotionPublisher {
    client: NotionClient,
    database_id: String,
    layout: RecordLayout,
}

impl NotionPublisher {
    pub fn new(client: NotionClient, database_id: impl Into<String>, layout: RecordLayout) -> Self {
        Self {
            client,
            database_id: database_id.into(),
            layout,
        }
    }
}

fn publish_error(err: NotionError) -> PublishError {
    match err {
        NotionError::Api { status, message } => PublishError::Rejected { status, message },
        other => PublishError::Request(other.to_string()),
    }
}

#[async_trait]
impl RecordPublisher for NotionPublisher {
    async fn publish(
        &self,
        insight: &Insight,
        bundle: &ContextBundle,
    ) -> Result<PublishReceipt, PublishError> {
        let record = self.layout.build(insight, bundle, Local::now().date_naive());
        let request = self.layout.page_request(&self.database_id, &record);
        match self.client.create_page(&request).await {
            Ok(page) => {
                info!(term = %record.term, page_id = %page.id, degraded = record.degraded, "Record published");
                Ok(PublishReceipt {
                    id: page.id,
                    url: page.url,
                })
            }
            Err(e) => {
                warn!(term = %record.term, transient = e.is_transient(), error = %e, "Record publish failed");
                Err(publish_error(e))
            }
        }
    }
}

// --- Dry run ---

/// Logs the record it would have written. Used by `--dry-run`.
pub struct DryRunPublisher {
    layout: RecordLayout,
}

impl DryRunPublisher {
    pub fn new(layout: RecordLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl RecordPublisher for DryRunPublisher {
    async fn publish(
        &self,
        insight: &Insight,
        bundle: &ContextBundle,
    ) -> Result<PublishReceipt, PublishError> {
        let record = self.layout.build(insight, bundle, Local::now().date_naive());
        let rendered = serde_json::to_string(&record)
            .map_err(|e| PublishError::Request(format!("failed to render record: {e}")))?;
        info!(term = %record.term, record = %rendered, "Dry run, record not written");
        Ok(PublishReceipt {
            id: format!("dry-run:{}", record.term),
            url: None,
        })
    }
}

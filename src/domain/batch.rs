use chrono::{DateTime, Utc};
use serde::Serialize;

use super::property::{Properties, PropertyValue};

pub const BATCH_ID: &str = "Batch ID";
pub const RUN_DATE: &str = "Run Date";
pub const STATUS: &str = "Status";
pub const LEADS_FOUND: &str = "Leads Found";
pub const LEADS_AFTER_DEDUP: &str = "Leads After Dedup";
pub const ERRORS: &str = "Errors";

/// Longest content Notion accepts in a single rich text segment.
pub const ERRORS_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Running,
    Completed,
    Partial,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Running => "Running",
            BatchStatus::Completed => "Completed",
            BatchStatus::Partial => "Partial",
            BatchStatus::Failed => "Failed",
        }
    }
}

pub fn opening_properties(
    batch_id: &str,
    run_date: DateTime<Utc>,
    leads_found: usize,
) -> Properties {
    let mut properties = reopening_properties(run_date, leads_found);
    properties.insert(BATCH_ID.to_string(), PropertyValue::title(batch_id));
    properties
}

/// Properties written when a batch id already has a record and is run again.
pub fn reopening_properties(run_date: DateTime<Utc>, leads_found: usize) -> Properties {
    let mut properties = Properties::new();
    properties.insert(RUN_DATE.to_string(), PropertyValue::date(run_date));
    properties.insert(
        STATUS.to_string(),
        PropertyValue::select(BatchStatus::Running.as_str()),
    );
    properties.insert(LEADS_FOUND.to_string(), PropertyValue::number(leads_found));
    properties
}

pub fn closing_properties(leads_created: usize, errors: &[String]) -> Properties {
    let status = if errors.is_empty() {
        BatchStatus::Completed
    } else {
        BatchStatus::Partial
    };
    let errors = if errors.is_empty() {
        PropertyValue::empty_rich_text()
    } else {
        PropertyValue::rich_text(&error_summary(errors))
    };

    let mut properties = Properties::new();
    properties.insert(STATUS.to_string(), PropertyValue::select(status.as_str()));
    properties.insert(
        LEADS_AFTER_DEDUP.to_string(),
        PropertyValue::number(leads_created),
    );
    properties.insert(ERRORS.to_string(), errors);
    properties
}

fn error_summary(errors: &[String]) -> String {
    errors.join("; ").chars().take(ERRORS_MAX_CHARS).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
    Error,
}

/// What the caller gets back from one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IngestionOutcome {
    Rejected { status: RunStatus, message: String },
    Summary(BatchSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub status: RunStatus,
    pub batch_id: String,
    pub leads_found: usize,
    pub leads_created: usize,
    pub duplicates_skipped: usize,
    pub errors: Vec<String>,
}

impl IngestionOutcome {
    pub fn rejected(message: impl Into<String>) -> Self {
        IngestionOutcome::Rejected {
            status: RunStatus::Error,
            message: message.into(),
        }
    }

    pub fn status(&self) -> RunStatus {
        match self {
            IngestionOutcome::Rejected { status, .. } => *status,
            IngestionOutcome::Summary(summary) => summary.status,
        }
    }
}

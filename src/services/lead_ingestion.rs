use chrono::Utc;
use serde_json::Value;

use crate::domain::{
    batch::{self, BatchSummary, IngestionOutcome, RunStatus, BATCH_ID},
    lead::{submitted_company_name, Lead, LeadBatch, COMPANY_NAME},
};

use super::{DatabaseQuery, NotionError, PageStore};

/// Identifiers of the two databases a run writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionDatabases {
    pub leads: String,
    pub batches: String,
}

enum LeadDisposition {
    Created,
    Duplicate,
}

#[derive(Debug, thiserror::Error)]
enum LeadError {
    #[error("{0}")]
    Unreadable(#[from] serde_json::Error),
    #[error(transparent)]
    Notion(#[from] NotionError),
}

/// Runs one ingestion: opens the batch record, creates every lead whose
/// company name is not yet known, then closes the batch record.
///
/// Failures never abort the run. They are collected into the returned
/// summary, which is then marked `partial`.
pub async fn ingest_leads(
    store: &dyn PageStore,
    databases: &NotionDatabases,
    payload: &Value,
) -> IngestionOutcome {
    let batch = match LeadBatch::parse(payload) {
        Ok(batch) => batch,
        Err(e) => return IngestionOutcome::rejected(e.to_string()),
    };

    log::info!(
        "Starting batch {} with {} leads",
        batch.batch_id,
        batch.leads.len()
    );

    let mut errors: Vec<String> = vec![];
    let mut created = 0;
    let mut duplicates = 0;

    if let Err(e) = open_batch(store, databases, &batch).await {
        log::error!("Could not open batch {}: {}", batch.batch_id, e);
        errors.push(format!("Batch creation error: {}", e));
    }

    for raw_lead in batch.leads.iter() {
        let company_name = submitted_company_name(raw_lead);
        match ingest_lead(store, databases, raw_lead).await {
            Ok(LeadDisposition::Created) => created += 1,
            Ok(LeadDisposition::Duplicate) => {
                log::info!("Skipping duplicate lead {}", company_name);
                duplicates += 1;
            }
            Err(e) => {
                log::error!("Failed to ingest lead {}: {}", company_name, e);
                errors.push(format!("Error processing {}: {}", company_name, e));
            }
        }
    }

    if let Err(e) = close_batch(store, databases, &batch.batch_id, created, &errors).await {
        log::error!("Could not close batch {}: {}", batch.batch_id, e);
        errors.push(format!("Batch update error: {}", e));
    }

    let status = if errors.is_empty() {
        RunStatus::Success
    } else {
        RunStatus::Partial
    };

    log::info!(
        "Finished batch {}: {} created, {} duplicates, {} errors",
        batch.batch_id,
        created,
        duplicates,
        errors.len()
    );

    IngestionOutcome::Summary(BatchSummary {
        status,
        batch_id: batch.batch_id,
        leads_found: batch.leads.len(),
        leads_created: created,
        duplicates_skipped: duplicates,
        errors,
    })
}

/// Creates the batch record, or reopens it when the id was used before.
async fn open_batch(
    store: &dyn PageStore,
    databases: &NotionDatabases,
    batch: &LeadBatch,
) -> Result<(), NotionError> {
    let now = Utc::now();
    let query = DatabaseQuery::title_equals(BATCH_ID, &batch.batch_id);
    let existing = store.query_database(&databases.batches, &query).await?;

    match existing.first() {
        Some(page) => {
            log::warn!(
                "Batch {} already has record {}, reopening it",
                batch.batch_id,
                page.id
            );
            let properties = batch::reopening_properties(now, batch.leads.len());
            store.update_page(&page.id, &properties).await?;
        }
        None => {
            let properties = batch::opening_properties(&batch.batch_id, now, batch.leads.len());
            store.create_page(&databases.batches, &properties).await?;
        }
    }

    Ok(())
}

async fn ingest_lead(
    store: &dyn PageStore,
    databases: &NotionDatabases,
    raw_lead: &Value,
) -> Result<LeadDisposition, LeadError> {
    let lead = Lead::from_value(raw_lead)?;

    let query = DatabaseQuery::title_equals(COMPANY_NAME, lead.company_name());
    let matches = store.query_database(&databases.leads, &query).await?;
    if !matches.is_empty() {
        return Ok(LeadDisposition::Duplicate);
    }

    let properties = lead.properties(Utc::now());
    store.create_page(&databases.leads, &properties).await?;

    Ok(LeadDisposition::Created)
}

async fn close_batch(
    store: &dyn PageStore,
    databases: &NotionDatabases,
    batch_id: &str,
    created: usize,
    errors: &[String],
) -> Result<(), NotionError> {
    let query = DatabaseQuery::title_equals(BATCH_ID, batch_id);
    let found = store.query_database(&databases.batches, &query).await?;

    let Some(page) = found.first() else {
        log::warn!("No record found for batch {}, leaving it unclosed", batch_id);
        return Ok(());
    };

    store
        .update_page(&page.id, &batch::closing_properties(created, errors))
        .await?;

    Ok(())
}

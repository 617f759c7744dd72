use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::{
    batch::BatchStatus,
    lead::LeadStatus,
    property::{Properties, PropertyValue},
};

use super::{NotionClient, NotionError, PageStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseIds {
    pub sources: String,
    pub batches: String,
    pub leads: String,
}

pub struct SourceSeed {
    pub name: &'static str,
    pub source_type: &'static str,
    pub url: &'static str,
    pub popia_status: &'static str,
    pub notes: Option<&'static str>,
}

pub const INITIAL_SOURCES: [SourceSeed; 6] = [
    SourceSeed {
        name: "CIPC Registrations",
        source_type: "Government Register",
        url: "https://eservices.cipc.co.za",
        popia_status: "Compliant",
        notes: None,
    },
    SourceSeed {
        name: "eTenders Portal",
        source_type: "Tender Portal",
        url: "https://www.etenders.gov.za",
        popia_status: "Compliant",
        notes: None,
    },
    SourceSeed {
        name: "Yellow Pages SA",
        source_type: "Business Directory",
        url: "https://www.yellowpages.co.za",
        popia_status: "Compliant",
        notes: None,
    },
    SourceSeed {
        name: "LinkedIn Company Pages",
        source_type: "Social Media",
        url: "https://www.linkedin.com",
        popia_status: "Caution Required",
        notes: Some("Public company pages only. Never scrape personal profiles."),
    },
    SourceSeed {
        name: "SAPS Crime Stats",
        source_type: "Crime Stats",
        url: "https://www.saps.gov.za/services/crimestats.php",
        popia_status: "Compliant",
        notes: Some("Vehicle theft hotspot data by area. Used for scoring, not lead sourcing."),
    },
    SourceSeed {
        name: "Road Freight Association",
        source_type: "Business Directory",
        url: "https://www.rfa.co.za",
        popia_status: "Compliant",
        notes: Some("Member directory of transport and logistics companies."),
    },
];

/// Properties the API cannot create; they have to be added by hand.
pub const MANUAL_STEPS: [&str; 5] = [
    "Leads: add formula 'Composite Score' = prop(\"Fleet Likelihood\") * 0.4 + prop(\"Tracking Need Score\") * 0.4 + if(prop(\"Est. Fleet Size\") == \"Large (20+)\", 2, if(prop(\"Est. Fleet Size\") == \"Medium (6-20)\", 1, 0)) * 0.2",
    "Leads: add formula 'Quality Gate' = if(prop(\"Composite Score\") >= 7, \"Auto-Approve\", if(prop(\"Composite Score\") >= 4, \"Review\", \"Auto-Reject\"))",
    "Leads: add person property 'QA Reviewed By'",
    "Sources: add rollup 'Leads Generated' counting all related leads",
    "Batches: add rollup 'QA Approved' counting related leads with Status = 'QA Approved'",
];

fn select(options: &[(&str, &str)]) -> Value {
    let options: Vec<Value> = options
        .iter()
        .map(|(name, color)| json!({"name": name, "color": color}))
        .collect();
    json!({"select": {"options": options}})
}

fn number(format: &str) -> Value {
    json!({"number": {"format": format}})
}

fn relation(database_id: &str) -> Value {
    json!({"relation": {"database_id": database_id, "single_property": {}}})
}

pub fn sources_schema() -> Value {
    json!({
        "Source Name": {"title": {}},
        "Source Type": select(&[
            ("Government Register", "blue"),
            ("Tender Portal", "green"),
            ("Business Directory", "yellow"),
            ("Social Media", "purple"),
            ("Crime Stats", "red"),
            ("Other", "gray"),
        ]),
        "URL": {"url": {}},
        "POPIA Status": select(&[
            ("Compliant", "green"),
            ("Caution Required", "yellow"),
            ("Blocked", "red"),
        ]),
        "Status": select(&[
            ("Active", "green"),
            ("Paused", "yellow"),
            ("Broken", "red"),
            ("Deprecated", "gray"),
        ]),
        "Last Crawled": {"date": {}},
        "Notes": {"rich_text": {}},
    })
}

pub fn batches_schema() -> Value {
    json!({
        "Batch ID": {"title": {}},
        "Run Date": {"date": {}},
        "Status": select(&[
            (BatchStatus::Running.as_str(), "blue"),
            (BatchStatus::Completed.as_str(), "green"),
            (BatchStatus::Partial.as_str(), "yellow"),
            (BatchStatus::Failed.as_str(), "red"),
        ]),
        "Leads Found": number("number"),
        "Leads After Dedup": number("number"),
        "Sources Crawled": {"rich_text": {}},
        "Errors": {"rich_text": {}},
        "API Cost (USD)": number("dollar"),
    })
}

pub fn leads_schema(sources_database_id: &str, batches_database_id: &str) -> Value {
    json!({
        "Company Name": {"title": {}},
        "CIPC Reg Number": {"rich_text": {}},
        "Industry": select(&[
            ("Transport & Logistics", "blue"),
            ("Construction", "brown"),
            ("Agriculture", "green"),
            ("Food & Catering", "orange"),
            ("Mining", "gray"),
            ("Rental Services", "purple"),
            ("Medical/Pharma", "pink"),
            ("Government", "yellow"),
            ("Retail & Distribution", "red"),
            ("Services", "default"),
            ("Other", "gray"),
        ]),
        "Segment": select(&[("B2B", "blue"), ("B2C", "green")]),
        "Province": select(&[
            ("Gauteng", "blue"),
            ("Western Cape", "green"),
            ("KwaZulu-Natal", "orange"),
            ("Eastern Cape", "yellow"),
            ("Free State", "red"),
            ("Limpopo", "brown"),
            ("Mpumalanga", "purple"),
            ("North West", "pink"),
            ("Northern Cape", "gray"),
        ]),
        "City / Area": {"rich_text": {}},
        "Website": {"url": {}},
        "LinkedIn URL": {"url": {}},
        "Public Contact": {"rich_text": {}},
        "Prospect Summary": {"rich_text": {}},
        "Company Profile": {"rich_text": {}},
        "Fleet Assessment": {"rich_text": {}},
        "Tracking Need Reasoning": {"rich_text": {}},
        "Call Script Opener": {"rich_text": {}},
        "Data Confidence": select(&[("High", "green"), ("Medium", "yellow"), ("Low", "red")]),
        "Sources Used": {"rich_text": {}},
        "Fleet Likelihood": number("number"),
        "Est. Fleet Size": select(&[
            ("Small (1-5)", "gray"),
            ("Medium (6-20)", "yellow"),
            ("Large (20+)", "green"),
            ("Unknown", "default"),
        ]),
        "Tracking Need Score": number("number"),
        "Status": select(&[
            (LeadStatus::PendingQa.as_str(), "default"),
            ("QA Approved", "green"),
            ("QA Rejected", "red"),
            ("Sent to Call Centre", "blue"),
            ("Contacted", "purple"),
            ("Interested", "yellow"),
            ("Converted", "green"),
            ("Not Interested", "orange"),
            ("Duplicate", "gray"),
        ]),
        "QA Review Date": {"date": {}},
        "QA Notes": {"rich_text": {}},
        "Rejection Reason": select(&[
            ("Incomplete profile", "yellow"),
            ("Already a customer", "gray"),
            ("Not relevant industry", "orange"),
            ("Too small", "red"),
            ("Out of service area", "purple"),
            ("Poor data quality", "brown"),
            ("Other", "default"),
        ]),
        "Date Found": {"date": {}},
        "Date Sent": {"date": {}},
        "Call Centre Feedback": {"rich_text": {}},
        "Notes": {"rich_text": {}},
        "Source": relation(sources_database_id),
        "Batch": relation(batches_database_id),
    })
}

pub fn source_properties(source: &SourceSeed) -> Properties {
    let mut properties = Properties::new();
    properties.insert("Source Name".to_string(), PropertyValue::title(source.name));
    properties.insert(
        "Source Type".to_string(),
        PropertyValue::select(source.source_type),
    );
    properties.insert("URL".to_string(), PropertyValue::url(source.url));
    properties.insert(
        "POPIA Status".to_string(),
        PropertyValue::select(source.popia_status),
    );
    properties.insert("Status".to_string(), PropertyValue::select("Active"));
    if let Some(notes) = source.notes {
        properties.insert("Notes".to_string(), PropertyValue::rich_text(notes));
    }
    properties
}

/// Creates the Sources, Batches and Leads databases under `parent_page_id`.
///
/// Leads is created last because it relates to the other two. Seeding is
/// best-effort: a source that fails to insert is logged and skipped.
pub async fn create_workspace(
    client: &NotionClient,
    parent_page_id: &str,
    seed_sources: bool,
) -> Result<DatabaseIds, NotionError> {
    let bot = client.me().await?;
    log::info!(
        "Connected to Notion as {}",
        bot.name.as_deref().unwrap_or("Unknown")
    );

    let sources = client
        .create_database(parent_page_id, "Sources", "🔗", sources_schema())
        .await?
        .id;
    log::info!("Created 'Sources' database {}", sources);

    let batches = client
        .create_database(parent_page_id, "Batches", "⚙️", batches_schema())
        .await?
        .id;
    log::info!("Created 'Batches' database {}", batches);

    let leads = client
        .create_database(
            parent_page_id,
            "Leads",
            "🎯",
            leads_schema(&sources, &batches),
        )
        .await?
        .id;
    log::info!("Created 'Leads' database {}", leads);

    if seed_sources {
        seed_initial_sources(client, &sources).await;
    }

    Ok(DatabaseIds {
        sources,
        batches,
        leads,
    })
}

/// Inserts [`INITIAL_SOURCES`], returning how many were written.
pub async fn seed_initial_sources(store: &dyn PageStore, sources_database_id: &str) -> usize {
    let mut seeded = 0;

    for source in INITIAL_SOURCES.iter() {
        match store
            .create_page(sources_database_id, &source_properties(source))
            .await
        {
            Ok(_) => {
                log::info!("Seeded source {}", source.name);
                seeded += 1;
            }
            Err(e) => log::error!("Failed to seed source {}: {}", source.name, e),
        }
    }

    seeded
}

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use serde_json::{Number, Value};

use super::property::{Properties, PropertyValue};

pub const COMPANY_NAME: &str = "Company Name";
pub const STATUS: &str = "Status";
pub const DATE_FOUND: &str = "Date Found";
pub const WEBSITE: &str = "Website";
pub const LINKEDIN_URL: &str = "LinkedIn URL";
pub const FLEET_LIKELIHOOD: &str = "Fleet Likelihood";
pub const TRACKING_NEED_SCORE: &str = "Tracking Need Score";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStatus {
    PendingQa,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::PendingQa => "Pending QA",
        }
    }
}

/// A prospect as submitted by the lead finder. Only `company_name` matters
/// for deduplication, everything else is descriptive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Lead {
    pub company_name: Option<String>,
    pub cipc_reg: Option<String>,
    pub city: Option<String>,
    pub contact: Option<String>,
    pub prospect_summary: Option<String>,
    pub company_profile: Option<String>,
    pub fleet_assessment: Option<String>,
    pub tracking_reasoning: Option<String>,
    pub call_script_opener: Option<String>,
    pub sources_used: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub industry: Option<String>,
    pub segment: Option<String>,
    pub province: Option<String>,
    pub fleet_size: Option<String>,
    pub data_confidence: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub fleet_likelihood: Option<Number>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub tracking_need: Option<Number>,
}

impl Lead {
    /// Reads one submitted lead. A badly typed field fails this lead only,
    /// the rest of its batch is unaffected.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Lead::deserialize(value)
    }

    pub fn company_name(&self) -> &str {
        self.company_name.as_deref().unwrap_or("")
    }

    /// Builds the page properties for a new lead. Text, url and select
    /// values are only written when non-empty; scores are written whenever
    /// present, zero included.
    pub fn properties(&self, found_at: DateTime<Utc>) -> Properties {
        let mut properties = Properties::new();
        properties.insert(
            COMPANY_NAME.to_string(),
            PropertyValue::title(self.company_name()),
        );
        properties.insert(
            STATUS.to_string(),
            PropertyValue::select(LeadStatus::PendingQa.as_str()),
        );
        properties.insert(DATE_FOUND.to_string(), PropertyValue::date(found_at));

        let text_fields = [
            ("CIPC Reg Number", &self.cipc_reg),
            ("City / Area", &self.city),
            ("Public Contact", &self.contact),
            ("Prospect Summary", &self.prospect_summary),
            ("Company Profile", &self.company_profile),
            ("Fleet Assessment", &self.fleet_assessment),
            ("Tracking Need Reasoning", &self.tracking_reasoning),
            ("Call Script Opener", &self.call_script_opener),
            ("Sources Used", &self.sources_used),
        ];
        for (name, value) in text_fields {
            if let Some(value) = non_empty(value) {
                properties.insert(name.to_string(), PropertyValue::rich_text(value));
            }
        }

        for (name, value) in [(WEBSITE, &self.website), (LINKEDIN_URL, &self.linkedin)] {
            if let Some(value) = non_empty(value) {
                properties.insert(name.to_string(), PropertyValue::url(value));
            }
        }

        let select_fields = [
            ("Industry", &self.industry),
            ("Segment", &self.segment),
            ("Province", &self.province),
            ("Est. Fleet Size", &self.fleet_size),
            ("Data Confidence", &self.data_confidence),
        ];
        for (name, value) in select_fields {
            if let Some(value) = non_empty(value) {
                properties.insert(name.to_string(), PropertyValue::select(value));
            }
        }

        let number_fields = [
            (FLEET_LIKELIHOOD, &self.fleet_likelihood),
            (TRACKING_NEED_SCORE, &self.tracking_need),
        ];
        for (name, value) in number_fields {
            if let Some(value) = value {
                properties.insert(name.to_string(), PropertyValue::Number(value.clone()));
            }
        }

        properties
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Name a submitted lead is reported under, readable even when the lead
/// itself is not.
pub fn submitted_company_name(value: &Value) -> String {
    match value.get("company_name") {
        Some(Value::String(name)) => name.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid payload")]
pub struct InvalidPayload;

#[derive(Deserialize)]
struct RawPayload {
    batch_id: Option<String>,
    leads: Option<Vec<Value>>,
}

/// A validated submission: a non-empty batch id and at least one lead.
/// Leads stay raw until processed, see [`Lead::from_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct LeadBatch {
    pub batch_id: String,
    pub leads: Vec<Value>,
}

impl LeadBatch {
    pub fn parse(payload: &Value) -> Result<Self, InvalidPayload> {
        let raw = RawPayload::deserialize(payload).map_err(|e| {
            log::warn!("Rejecting malformed payload: {}", e);
            InvalidPayload
        })?;

        match (raw.batch_id, raw.leads) {
            (Some(batch_id), Some(leads)) if !batch_id.is_empty() && !leads.is_empty() => {
                Ok(LeadBatch { batch_id, leads })
            }
            _ => Err(InvalidPayload),
        }
    }
}

mod health_check;
mod helpers;
mod lead_ingestion;

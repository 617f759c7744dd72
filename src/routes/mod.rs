pub mod default_route;
pub mod ingestion_route;

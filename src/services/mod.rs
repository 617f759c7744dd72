pub mod lead_ingestion;
pub mod notion_client;
pub mod workspace_setup;

pub use lead_ingestion::*;
pub use notion_client::*;
pub use workspace_setup::*;

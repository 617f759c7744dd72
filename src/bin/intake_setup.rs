use std::{fs, path::PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use env_logger::Env;
use intake::{
    configuration::get_configuration,
    services::{create_workspace, MANUAL_STEPS},
};
use serde::Serialize;

/// Create the Sources, Batches and Leads databases in a Notion workspace.
#[derive(Parser, Debug)]
#[command(name = "intake-setup")]
struct Args {
    /// Page the databases are created under; overrides `notion.parent_page_id`.
    #[arg(long, env = "NOTION_PAGE_ID")]
    parent_page_id: Option<String>,

    /// Where the created database ids are written.
    #[arg(long, default_value = "notion_config.json")]
    output: PathBuf,

    /// Leave the Sources database empty.
    #[arg(long)]
    skip_seed: bool,
}

#[derive(Serialize)]
struct NotionConfigFile {
    leads_database_id: String,
    sources_database_id: String,
    batches_database_id: String,
    notion_api_version: String,
    created_at: DateTime<Utc>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let configuration = get_configuration().context("Failed to read configuration.")?;
    if configuration.notion.has_placeholder_key() {
        anyhow::bail!("NOTION_API_KEY is not set");
    }
    let parent_page_id = args
        .parent_page_id
        .or(configuration.notion.parent_page_id.clone())
        .context("No parent page id; set NOTION_PAGE_ID or notion.parent_page_id")?;

    let notion_client = configuration
        .notion
        .client()
        .context("Failed to build the Notion client.")?;

    let ids = create_workspace(&notion_client, &parent_page_id, !args.skip_seed)
        .await
        .context("Failed to create the Notion databases")?;

    let config_file = NotionConfigFile {
        leads_database_id: ids.leads,
        sources_database_id: ids.sources,
        batches_database_id: ids.batches,
        notion_api_version: configuration.notion.version.clone(),
        created_at: Utc::now(),
    };
    fs::write(&args.output, serde_json::to_string_pretty(&config_file)?)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("Database ids saved to {}", args.output.display());

    for step in MANUAL_STEPS {
        log::info!("Manual step: {}", step);
    }

    Ok(())
}

use std::{net::TcpListener, sync::Arc};

use anyhow::Context;
use env_logger::Env;
use intake::{configuration::get_configuration, startup::run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;
    if configuration.notion.has_placeholder_key() {
        log::warn!("NOTION_API_KEY is not set, requests to Notion will be rejected");
    }

    let notion_client = configuration
        .notion
        .client()
        .context("Failed to build the Notion client.")?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Listening for lead batches on {}", address);

    run(
        listener,
        Arc::new(notion_client),
        configuration.notion.databases(),
        configuration.webhook,
        configuration.application.max_body_bytes,
    )?
    .await?;

    Ok(())
}

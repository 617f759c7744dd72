use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use intake::{configuration::get_configuration, services::ingest_leads};
use serde_json::Value;

/// Ingest one lead batch from a JSON file and print the run summary.
#[derive(Parser, Debug)]
#[command(name = "intake-file")]
struct Args {
    /// Path to the batch payload, or `-` to read it from stdin.
    payload: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let configuration = get_configuration().context("Failed to read configuration.")?;
    let notion_client = configuration
        .notion
        .client()
        .context("Failed to build the Notion client.")?;

    let raw = if args.payload.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read payload from stdin")?;
        buffer
    } else {
        fs::read_to_string(&args.payload)
            .with_context(|| format!("Failed to read {}", args.payload.display()))?
    };
    let payload: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

    let outcome = ingest_leads(&notion_client, &configuration.notion.databases(), &payload).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}

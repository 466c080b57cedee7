//! CLI mode
//!
//! One-shot maintenance commands, suitable for cron.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::config::StaticConfig;
use crate::runtime::lifetime;
use crate::services::LinkService;

const DEFAULT_SAMPLE_PATH: &str = "config.example.toml";

/// Runs the expiry sweep once and returns the number of deleted links
pub async fn run_cleanup(config: &StaticConfig) -> Result<u64> {
    let storage = lifetime::startup::prepare_storage(config).await?;
    let links = LinkService::from_config(storage.clone(), &config.links);

    let deleted = links
        .sweep_expired(Utc::now())
        .await
        .context("Expiry sweep failed")?;

    info!("Cleanup finished, {} expired links deleted", deleted);
    Ok(deleted)
}

/// Writes a sample configuration file and returns its path
pub fn run_config_generate(output_path: Option<String>) -> Result<String> {
    let path = output_path.unwrap_or_else(|| DEFAULT_SAMPLE_PATH.to_string());
    StaticConfig::default()
        .save_to_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path, e))?;
    Ok(path)
}

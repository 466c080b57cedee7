use anyhow::Result;
use clap::Parser;

use snaplink::cli::{Cli, Commands, ConfigCommands};
use snaplink::config::{StaticConfig, get_config, init_config_from_path};
use snaplink::runtime::modes::{run_cleanup, run_config_generate, run_server};
use snaplink::system::logging::init_logging;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

fn load_config_and_logging(path: &str) -> Result<(Arc<StaticConfig>, WorkerGuard)> {
    init_config_from_path(path);
    let config = get_config();
    let guard = init_logging(&config.logging)?;
    Ok((config, guard))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let (config, _guard) = load_config_and_logging(&cli.config)?;
            run_server(&config).await
        }
        Commands::Cleanup => {
            let (config, _guard) = load_config_and_logging(&cli.config)?;
            let deleted = run_cleanup(&config).await?;
            println!("Deleted {} expired links", deleted);
            Ok(())
        }
        Commands::Config {
            action: ConfigCommands::Generate { output_path },
        } => {
            let path = run_config_generate(output_path)?;
            println!("Sample configuration written to {}", path);
            Ok(())
        }
    }
}

use clap::Parser;
use livehub::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_and_merge_config(&cli)?;
    let _log_handle = init_logger_from_settings(&settings)?;
    tracing::debug!(version = livehub::pkg_version(), "livehub starting");

    execute_command(&cli, settings).await?;
    Ok(())
}

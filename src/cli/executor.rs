//! Dispatches a parsed command to its handler.

use super::handlers::{CheckCommandHandler, FollowsCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::AppResult;

/// Runs the command in `cli`. No subcommand means `check`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match &cli.command {
        Some(Commands::Check) | None => CheckCommandHandler::new(settings).execute().await,
        Some(Commands::Follows { action }) => {
            FollowsCommandHandler::new(&settings).execute(action).await
        }
    }
}

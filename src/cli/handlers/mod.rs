//! Command handlers for CLI operations

pub mod check;
pub mod follows;

pub use check::CheckCommandHandler;
pub use follows::FollowsCommandHandler;

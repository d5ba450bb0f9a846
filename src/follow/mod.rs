//! Cross-platform follow list with periodic status refresh.

mod model;
mod repository;
mod scheduler;
mod store;

pub use model::FollowedStreamer;
pub use repository::{FollowRepository, JsonFileFollowRepository};
pub use scheduler::FollowRefreshScheduler;
pub use store::{FollowStore, RefreshSummary};

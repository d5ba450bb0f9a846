//! livehub
//!
//! Aggregates live rooms from Huya, Douyu, Douyin and Bilibili: paginated
//! room lists, playback URL resolution through a local relay, chat feeds and
//! a persisted follow list. Network access and the relay itself are supplied
//! by the host through the traits in [`external::backend`].

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod danmaku;
pub mod error;
pub mod external;
pub mod follow;
pub mod hub;
pub mod logger;
pub mod pager;
pub mod playback;
pub mod session;

#[cfg(test)]
mod test_support;

pub use hub::{Collaborators, LiveHub};

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}

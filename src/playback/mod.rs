//! Stream resolution and the local relay session.

mod controller;
mod format;
mod proxy;

pub use controller::{PlaybackSource, RetryPolicy, StreamController, is_loopback, select_variant};
pub use format::{ContainerFormat, FormatClassifier};
pub use proxy::{ActiveProxy, ProxySession, ProxyTicket};

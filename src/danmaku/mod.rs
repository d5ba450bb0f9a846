//! Chat ingestion: listener lifecycle, payload parsing and the display buffer.

mod buffer;
mod feed;
mod message;
mod parser;
mod pipeline;

pub use buffer::{BoundedBuffer, DEFAULT_CAPACITY};
pub use feed::ChatFeed;
pub use message::{DanmakuKind, DanmakuMessage, ENTER_NOTICE, UNKNOWN_SENDER};
pub use parser::channel_name;
pub use pipeline::{DanmakuPipeline, DanmakuSession};

mod adapter;
mod types;

pub use adapter::{DOUYU_PAGE_SIZE, DouyuLive};

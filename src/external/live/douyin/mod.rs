mod adapter;
mod types;

pub use adapter::{DOUYIN_PAGE_SIZE, DouyinLive};

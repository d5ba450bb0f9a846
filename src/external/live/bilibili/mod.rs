mod adapter;
mod types;

pub use adapter::{BILIBILI_PAGE_SIZE, BilibiliLive};

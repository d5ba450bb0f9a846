mod adapter;
mod types;

pub use adapter::{HUYA_PAGE_SIZE, HuyaLive};

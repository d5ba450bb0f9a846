//! Room list paging
//!
//! One [`RoomListPager`] drives one platform adapter through category
//! selections and incremental loads, publishing [`ListState`] snapshots.

mod room_list;
mod state;

pub use room_list::RoomListPager;
pub use state::{ListState, PagerState};

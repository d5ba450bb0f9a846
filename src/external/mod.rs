pub mod backend;
pub mod events;
pub mod live;

pub use backend::{
    BackendError, BackendErrorKind, BackendResult, DanmakuBackend, ListRoomsRequest, LiveBackend,
    ProxyRelay,
};
pub use events::{DanmakuEventSource, EventBus, EventSubscription};

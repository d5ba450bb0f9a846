mod bilibili;
mod douyin;
mod douyu;
mod huya;
mod pagination;
mod platform;
mod provider;
mod types;

pub use bilibili::{BILIBILI_PAGE_SIZE, BilibiliLive};
pub use douyin::{DOUYIN_PAGE_SIZE, DouyinLive};
pub use douyu::{DOUYU_PAGE_SIZE, DouyuLive};
pub use huya::{HUYA_PAGE_SIZE, HuyaLive};
pub use pagination::{
    CountAwareStrategy, Cursor, FullPageStrategy, PageCountStrategy, PageReport,
    PaginationStrategy, ServerFlagStrategy,
};
pub use platform::LivePlatform;
pub use provider::PlatformAdapter;
pub(crate) use provider::{deserialize_optional_count, deserialize_optional_id};
pub use types::{
    Category, CommonStreamer, Delivery, LiveStatus, PLACEHOLDER_COVER, PLACEHOLDER_NICKNAME,
    PLACEHOLDER_TITLE, RoomPage, StatusUpdate, StreamDescriptor, StreamVariant,
};

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::PagerConfig;
use crate::error::{AppError, AppResult};
use crate::external::backend::LiveBackend;

/// Adapters keyed by platform.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<LivePlatform, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers the four built-in adapters with their default page sizes.
    pub fn with_backend(backend: Arc<dyn LiveBackend>) -> Self {
        Self::from_config(backend, &PagerConfig::default())
    }

    pub fn from_config(backend: Arc<dyn LiveBackend>, config: &PagerConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(BilibiliLive::with_page_size(
            backend.clone(),
            config.page_size(LivePlatform::Bilibili),
        )));
        registry.register(Arc::new(DouyinLive::with_page_size(
            backend.clone(),
            config.page_size(LivePlatform::Douyin),
        )));
        registry.register(Arc::new(DouyuLive::with_page_size(
            backend.clone(),
            config.page_size(LivePlatform::Douyu),
        )));
        registry.register(Arc::new(HuyaLive::with_page_size(
            backend,
            config.page_size(LivePlatform::Huya),
        )));
        registry
    }

    /// Adds or replaces the adapter for its platform.
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn get(&self, platform: LivePlatform) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform).cloned()
    }

    pub fn require(&self, platform: LivePlatform) -> AppResult<Arc<dyn PlatformAdapter>> {
        self.get(platform).ok_or_else(|| AppError::Validation {
            field: "platform".to_string(),
            reason: format!("no adapter registered for {}", platform),
        })
    }

    pub fn platforms(&self) -> Vec<LivePlatform> {
        let mut platforms: Vec<_> = self.adapters.keys().copied().collect();
        platforms.sort();
        platforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBackend;

    #[test]
    fn test_registry_has_all_platforms() {
        let registry = AdapterRegistry::with_backend(Arc::new(FakeBackend::new()));
        assert_eq!(registry.platforms(), LivePlatform::ALL.to_vec());
        for platform in LivePlatform::ALL {
            assert_eq!(registry.require(platform).unwrap().platform(), platform);
        }
    }

    #[test]
    fn test_page_sizes_from_config() {
        let config = PagerConfig {
            huya_page_size: 60,
            ..PagerConfig::default()
        };
        let registry = AdapterRegistry::from_config(Arc::new(FakeBackend::new()), &config);
        assert_eq!(registry.require(LivePlatform::Huya).unwrap().page_size(), 60);
        assert_eq!(registry.require(LivePlatform::Douyin).unwrap().page_size(), 15);
    }

    #[test]
    fn test_empty_registry_rejects() {
        let registry = AdapterRegistry::empty();
        assert!(matches!(
            registry.require(LivePlatform::Douyu),
            Err(AppError::Validation { .. })
        ));
    }
}

use crate::core::cache::ExternalSourceCache;
use crate::domain::model::{RefreshOutcome, SourceTag};
use std::sync::Arc;

/// 可被手動清除的快取
pub trait Invalidate: Send + Sync {
    fn invalidate_source(&self, source: SourceTag);
}

impl<T> Invalidate for ExternalSourceCache<T>
where
    T: Clone + Send + Sync,
{
    fn invalidate_source(&self, source: SourceTag) {
        self.invalidate(source);
    }
}

/// 手動更新快取：只標記失效，不等待也不觸發重抓
#[derive(Clone)]
pub struct RefreshCommand {
    targets: Vec<(SourceTag, Arc<dyn Invalidate>)>,
}

impl RefreshCommand {
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, source: SourceTag, cache: Arc<dyn Invalidate>) -> Self {
        self.targets.push((source, cache));
        self
    }

    pub fn execute(&self) -> RefreshOutcome {
        for (source, cache) in &self.targets {
            cache.invalidate_source(*source);
        }

        let names: Vec<&str> = self.targets.iter().map(|(s, _)| s.as_str()).collect();
        tracing::info!("🔄 External caches invalidated: {}", names.join(", "));

        RefreshOutcome {
            success: true,
            message: format!("Cache cleared for: {}", names.join(", ")),
        }
    }
}

impl Default for RefreshCommand {
    fn default() -> Self {
        Self::new()
    }
}

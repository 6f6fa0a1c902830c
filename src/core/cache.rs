//! Process-wide TTL cache for the external reservation sources.
//!
//! Each `(source, period)` key owns a slot with its own async mutex. The first
//! caller that finds the slot cold performs the fetch while holding the lock;
//! callers queued behind it observe the outcome of that attempt (value, stale
//! fallback or error) instead of starting a second fetch. Other keys are never
//! blocked by it.
//!
//! Invalidation bumps a per-source generation. Entries fetched under an older
//! generation are treated as cold on their next read, whatever their age.
//! A caller that enters after an invalidation never shares an attempt started
//! before it. Slots whose key has never fetched successfully are dropped after
//! the failed attempt.

use crate::domain::model::SourceTag;
use crate::utils::error::ExternalFetchError;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: SourceTag,
    /// `YYYY-MM`
    pub period: (i32, u32),
}

impl CacheKey {
    pub fn new(source: SourceTag, year: i32, month: u32) -> Self {
        Self {
            source,
            period: (year, month),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: Instant,
    pub ttl: Duration,
    generation: u64,
}

impl<T> CacheEntry<T> {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    fn is_fresh(&self, now: Instant, generation: u64) -> bool {
        self.generation == generation && self.age(now) < self.ttl
    }
}

/// 這次讀取的值是怎麼來的
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    /// 由本次（或同一批等待者共用的）抓取取得
    Fetched,
    /// TTL 內命中
    Hit,
    /// 抓取失敗，退回過期的舊值
    Stale,
}

#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    pub value: T,
    pub origin: CacheOrigin,
    /// 失敗時的原因（僅 `Stale` 才有）
    pub error: Option<ExternalFetchError>,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// 抓取失敗時，舊值最多可以多舊仍被使用
    pub max_staleness: Duration,
    /// 單次外部抓取的時間上限
    pub fetch_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_staleness: Duration::from_secs(24 * 60 * 60),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

struct SlotState<T> {
    entry: Option<CacheEntry<T>>,
    last_error: Option<ExternalFetchError>,
    /// 最近一次抓取開始時的 generation
    attempt_generation: u64,
}

struct Slot<T> {
    /// 已完成的抓取次數；等待者用它判斷排隊期間是否已有人抓過
    attempts: AtomicU64,
    state: Mutex<SlotState<T>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            attempts: AtomicU64::new(0),
            state: Mutex::new(SlotState {
                entry: None,
                last_error: None,
                attempt_generation: 0,
            }),
        }
    }
}

pub struct ExternalSourceCache<T> {
    slots: DashMap<CacheKey, Arc<Slot<T>>>,
    generations: DashMap<SourceTag, u64>,
    settings: CacheSettings,
}

impl<T> ExternalSourceCache<T>
where
    T: Clone + Send + Sync,
{
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            slots: DashMap::new(),
            generations: DashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// 取得快取值；過期或被標記失效時呼叫 `fetch` 重新抓取
    pub async fn get<F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<CacheRead<T>, ExternalFetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ExternalFetchError>>,
    {
        let slot = self.slot(key);
        let seen_attempts = slot.attempts.load(Ordering::Acquire);
        let entered_generation = self.generation(key.source);

        let mut state = slot.state.lock().await;
        let generation = self.generation(key.source);
        let now = Instant::now();

        if let Some(entry) = state.entry.as_ref().filter(|e| e.is_fresh(now, generation)) {
            tracing::debug!(source = %key.source, period = ?key.period, "cache hit");
            return Ok(CacheRead {
                value: entry.value.clone(),
                origin: CacheOrigin::Hit,
                error: None,
            });
        }

        // 排隊期間已經有人抓過，且那次抓取不早於進場時的失效：共用結果，不再重抓
        if slot.attempts.load(Ordering::Acquire) != seen_attempts
            && state.attempt_generation >= entered_generation
        {
            tracing::debug!(source = %key.source, period = ?key.period, "sharing in-flight result");
            return self.settle(key.source, &state, now);
        }

        tracing::debug!(source = %key.source, period = ?key.period, "cache miss, fetching");
        state.attempt_generation = generation;
        let result = match tokio::time::timeout(self.settings.fetch_timeout, fetch()).await {
            Ok(result) => result,
            Err(_) => Err(ExternalFetchError::Timeout {
                origin: key.source,
                after: self.settings.fetch_timeout,
            }),
        };

        let now = Instant::now();
        match result {
            Ok(value) => {
                state.entry = Some(CacheEntry {
                    value,
                    fetched_at: now,
                    ttl,
                    generation,
                });
                state.last_error = None;
            }
            Err(err) => {
                tracing::warn!(
                    source = %key.source,
                    period = ?key.period,
                    error = %err,
                    "external fetch failed"
                );
                state.last_error = Some(err);
            }
        }
        slot.attempts.fetch_add(1, Ordering::Release);

        // 從未成功過的 key 不保留 slot，避免任意年月把表撐大
        if state.entry.is_none() {
            self.slots.remove_if(&key, |_, current| Arc::ptr_eq(current, &slot));
        }

        self.settle(key.source, &state, now)
    }

    /// 讓該來源所有期間的快取在下一次讀取時強制重抓；不會自己去抓
    pub fn invalidate(&self, source: SourceTag) {
        *self.generations.entry(source).or_insert(0) += 1;
        tracing::info!(source = %source, "cache invalidated");
    }

    fn generation(&self, source: SourceTag) -> u64 {
        self.generations.get(&source).map(|g| *g).unwrap_or(0)
    }

    fn slot(&self, key: CacheKey) -> Arc<Slot<T>> {
        Arc::clone(
            self.slots
                .entry(key)
                .or_insert_with(|| Arc::new(Slot::new()))
                .value(),
        )
    }

    /// 把最近一次抓取的結果轉成回傳值
    fn settle(
        &self,
        source: SourceTag,
        state: &SlotState<T>,
        now: Instant,
    ) -> Result<CacheRead<T>, ExternalFetchError> {
        match (&state.last_error, &state.entry) {
            (None, Some(entry)) => Ok(CacheRead {
                value: entry.value.clone(),
                origin: CacheOrigin::Fetched,
                error: None,
            }),
            (Some(err), Some(entry)) if entry.age(now) <= self.settings.max_staleness => {
                Ok(CacheRead {
                    value: entry.value.clone(),
                    origin: CacheOrigin::Stale,
                    error: Some(err.clone()),
                })
            }
            (Some(err), _) => Err(err.clone()),
            // 至少完成過一次抓取才會走到這裡
            (None, None) => Err(ExternalFetchError::Http {
                origin: source,
                message: "cache slot has no recorded fetch".to_string(),
            }),
        }
    }
}
